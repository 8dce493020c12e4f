//! API endpoints.

mod auth;
mod polls;
mod questions;
mod rooms;
mod sessions;

use axum::Router;

use crate::middleware::AppState;
use crate::rate_limit::RateLimiterState;

/// Create the API router.
///
/// The join and auth routes carry their own per-IP limiters.
pub fn router(limiter: RateLimiterState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router(limiter.clone()))
        .nest("/rooms", rooms::router())
        .nest("/sessions", sessions::router(limiter))
        .merge(questions::router())
        .merge(polls::router())
}
