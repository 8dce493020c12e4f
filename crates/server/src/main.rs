//! Classroom server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use classroom_api::{AppState, RateLimiterState, StreamingState};
use classroom_common::Config;
use classroom_core::{
    AccountService, EventPublisherService, PollService, QuestionService, RoomService,
    SessionAccess, SessionService, TokenService,
};
use classroom_db::repositories::{
    ParticipantRepository, PollRepository, PollVoteRepository, QuestionRepository,
    RoomRepository, SessionRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often idle rate-limit buckets are dropped.
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Waits for SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classroom=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting classroom server...");

    let config = Config::load()?;
    let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_secs)?;

    let db = Arc::new(classroom_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    classroom_db::migrate(&db).await?;
    info!("Migrations completed");

    // Repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let room_repo = RoomRepository::new(Arc::clone(&db));
    let session_repo = SessionRepository::new(Arc::clone(&db));
    let participant_repo = ParticipantRepository::new(Arc::clone(&db));
    let question_repo = QuestionRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let poll_vote_repo = PollVoteRepository::new(Arc::clone(&db));

    // Session events go straight to connected WebSocket clients
    let streaming = StreamingState::new();
    let events: EventPublisherService = Arc::new(streaming.clone());
    let access = SessionAccess::new(session_repo.clone(), room_repo.clone());

    let state = AppState {
        account_service: AccountService::new(user_repo, tokens.clone()),
        room_service: RoomService::new(room_repo.clone()),
        session_service: SessionService::new(
            session_repo,
            room_repo,
            participant_repo.clone(),
            tokens.clone(),
            events.clone(),
        ),
        question_service: QuestionService::new(
            question_repo,
            participant_repo,
            access.clone(),
            events.clone(),
        ),
        poll_service: PollService::new(poll_repo, poll_vote_repo, access, events),
        tokens,
        streaming,
        rate_limiter: RateLimiterState::default().with_trusted_proxy(config.server.trust_proxy),
    };

    let cleanup = state.rate_limiter.spawn_cleanup(RATE_LIMIT_CLEANUP_INTERVAL);

    let app = classroom_api::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cleanup.abort();
    info!("Server shutdown complete");
    Ok(())
}
