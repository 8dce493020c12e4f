//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use classroom_core::{
    AccountService, PollService, QuestionService, RoomService, SessionService, TokenService,
};

use crate::rate_limit::RateLimiterState;
use crate::streaming::StreamingState;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub room_service: RoomService,
    pub session_service: SessionService,
    pub question_service: QuestionService,
    pub poll_service: PollService,
    pub tokens: TokenService,
    pub streaming: StreamingState,
    pub rate_limiter: RateLimiterState,
}

/// Marker left in request extensions when a bearer token failed verification.
#[derive(Debug, Clone, Copy)]
pub struct TokenRejected;

/// Authentication middleware.
///
/// Decodes `Authorization: Bearer <token>` into [`classroom_core::Claims`]
/// in the request extensions. Requests without a token pass through
/// anonymously; the extractors decide whether identity is required.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        match state.tokens.verify_claims(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(_) => {
                req.extensions_mut().insert(TokenRejected);
            }
        }
    }

    next.run(req).await
}
