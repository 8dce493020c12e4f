//! Session lookup, closing and joining.

use axum::{
    Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use classroom_common::{AppResult, parse_id};
use classroom_core::JoinInput;
use serde::Serialize;

use crate::{
    extractors::{ApiJson, AuthClaims, AuthTeacher},
    middleware::AppState,
    rate_limit::{RateLimiterState, rate_limit_join_middleware},
    response::ApiResponse,
    views::{ParticipantView, SessionView},
};

/// Result of joining a session by code.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub session: SessionView,
    pub participant: ParticipantView,
    pub token: String,
}

pub fn router(limiter: RateLimiterState) -> Router<AppState> {
    // The `{id}` segment of the join route carries the join code.
    let join = Router::new()
        .route("/{id}/join", post(join))
        .route_layer(from_fn_with_state(limiter, rate_limit_join_middleware));

    Router::new()
        .route("/{id}", get(show))
        .route("/{id}/close", post(close))
        .route("/code/{code}", get(show_by_code))
        .merge(join)
}

async fn show(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<SessionView>> {
    let id = parse_id(&id)?;
    let session = state.session_service.get(&claims, &id).await?;
    Ok(ApiResponse::ok(session.into()))
}

/// Public lookup so students can check a code before joining.
async fn show_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<SessionView>> {
    let session = state.session_service.get_by_code(&code).await?;
    Ok(ApiResponse::ok(session.into()))
}

async fn close(
    teacher: AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<SessionView>> {
    let id = parse_id(&id)?;
    let session = state.session_service.close(&teacher.id, &id).await?;
    Ok(ApiResponse::ok(session.into()))
}

async fn join(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(input): ApiJson<JoinInput>,
) -> AppResult<ApiResponse<JoinResponse>> {
    let outcome = state.session_service.join(&code, input).await?;

    let response = JoinResponse {
        session: outcome.session.into(),
        participant: outcome.participant.into(),
        token: outcome.token,
    };

    Ok(if outcome.newly_joined {
        ApiResponse::created(response)
    } else {
        ApiResponse::ok(response)
    })
}
