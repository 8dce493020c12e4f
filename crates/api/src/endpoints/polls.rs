//! Polls.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use classroom_common::{AppResult, parse_id};
use classroom_core::{VoteInput, schema::PollInput};

use crate::{
    extractors::{ApiJson, AuthClaims, AuthParticipant, AuthTeacher},
    middleware::AppState,
    response::ApiResponse,
    views::PollView,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions/{id}/polls", get(list).post(create))
        .route("/polls/{id}/vote", post(vote))
        .route("/polls/{id}/close", post(close))
}

async fn list(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<PollView>>> {
    let session_id = parse_id(&id)?;
    let polls = state.poll_service.list(&claims, &session_id).await?;
    Ok(ApiResponse::ok(PollView::list(polls)?))
}

async fn create(
    teacher: AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(mut input): ApiJson<PollInput>,
) -> AppResult<ApiResponse<PollView>> {
    // The path names the session; any body value is overridden.
    input.session_id = id;
    let poll = state.poll_service.create(&teacher.id, input).await?;
    Ok(ApiResponse::created(PollView::try_from(poll)?))
}

async fn vote(
    participant: AuthParticipant,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<VoteInput>,
) -> AppResult<ApiResponse<PollView>> {
    let poll_id = parse_id(&id)?;
    let poll = state
        .poll_service
        .vote(&participant.id, &participant.session_id, &poll_id, input)
        .await?;
    Ok(ApiResponse::ok(PollView::try_from(poll)?))
}

async fn close(
    teacher: AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PollView>> {
    let poll_id = parse_id(&id)?;
    let poll = state.poll_service.close(&teacher.id, &poll_id).await?;
    Ok(ApiResponse::ok(PollView::try_from(poll)?))
}
