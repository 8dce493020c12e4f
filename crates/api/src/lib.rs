//! HTTP API layer for the classroom backend.
//!
//! This crate provides the REST API and the live session channel:
//!
//! - **Endpoints**: auth, rooms, sessions, questions and polls under `/api`
//! - **Extractors**: teacher and participant identities, JSON bodies
//! - **Middleware**: bearer-token decoding, per-IP rate limiting
//! - **Streaming**: WebSocket fan-out of session events
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;
pub mod streaming;
pub mod views;

use axum::{Router, middleware as axum_middleware, routing::get};

pub use endpoints::router;
pub use middleware::AppState;
pub use rate_limit::{ApiRateLimiter, RateLimitConfig, RateLimiterState};
pub use streaming::{StreamingState, streaming_handler};

/// Assemble the API and streaming routes with token decoding applied.
///
/// Transport layers (tracing, CORS) are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/streaming", get(streaming_handler))
        .nest("/api", router(state.rate_limiter.clone()))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
}
