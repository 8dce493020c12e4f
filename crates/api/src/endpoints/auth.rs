//! Teacher signup and signin.

use axum::{Router, extract::State, middleware::from_fn_with_state, routing::post};
use classroom_common::AppResult;
use classroom_core::{AuthSession, SigninInput, SignupInput};
use serde::Serialize;

use crate::{
    extractors::ApiJson,
    middleware::AppState,
    rate_limit::{RateLimiterState, rate_limit_auth_middleware},
    response::ApiResponse,
    views::TeacherView,
};

/// Token plus the account it belongs to.
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: TeacherView,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            user: session.user.into(),
        }
    }
}

pub fn router(limiter: RateLimiterState) -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route_layer(from_fn_with_state(limiter, rate_limit_auth_middleware))
}

async fn signup(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SignupInput>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let session = state.account_service.signup(input).await?;
    Ok(ApiResponse::created(session.into()))
}

async fn signin(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SigninInput>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let session = state.account_service.signin(input).await?;
    Ok(ApiResponse::ok(session.into()))
}
