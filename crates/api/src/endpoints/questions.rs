//! Question board.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use classroom_common::{AppResult, parse_id};
use classroom_core::AskQuestionInput;

use crate::{
    extractors::{ApiJson, AuthClaims, AuthParticipant},
    middleware::AppState,
    response::ApiResponse,
    views::QuestionView,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions/{id}/questions", get(list).post(ask))
        .route("/questions/{id}/upvote", post(upvote))
}

async fn list(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<QuestionView>>> {
    let session_id = parse_id(&id)?;
    let questions = state.question_service.list(&claims, &session_id).await?;
    Ok(ApiResponse::ok(QuestionView::list(questions)))
}

async fn ask(
    participant: AuthParticipant,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AskQuestionInput>,
) -> AppResult<ApiResponse<QuestionView>> {
    let session_id = parse_id(&id)?;
    let question = state
        .question_service
        .ask(&participant.id, &participant.session_id, &session_id, input)
        .await?;
    Ok(ApiResponse::created(question.into()))
}

/// Returns the whole board in its new order.
async fn upvote(
    participant: AuthParticipant,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<QuestionView>>> {
    let question_id = parse_id(&id)?;
    let questions = state
        .question_service
        .upvote(&participant.session_id, &question_id)
        .await?;
    Ok(ApiResponse::ok(QuestionView::list(questions)))
}
