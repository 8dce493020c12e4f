//! Room management and the sessions opened under each room.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use classroom_common::AppResult;
use classroom_core::schema::{
    CreateRoomInput, CreateSessionInput, ListQueryParams, SessionListQueryParams, UpdateRoomInput,
    parse_list_query, parse_room_id, parse_session_list_query,
};
use serde::Serialize;

use crate::{
    extractors::{ApiJson, AuthTeacher},
    middleware::AppState,
    response::{ApiResponse, no_content},
    views::{RoomView, SessionView},
};

/// One page of rooms.
#[derive(Serialize)]
pub struct RoomPageResponse {
    pub items: Vec<RoomView>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).patch(update).delete(remove))
        .route("/{id}/sessions", get(list_sessions).post(create_session))
}

async fn create(
    teacher: AuthTeacher,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateRoomInput>,
) -> AppResult<ApiResponse<RoomView>> {
    let room = state.room_service.create(&teacher.id, input).await?;
    Ok(ApiResponse::created(room.into()))
}

async fn list(
    teacher: AuthTeacher,
    State(state): State<AppState>,
    Query(params): Query<ListQueryParams>,
) -> AppResult<ApiResponse<RoomPageResponse>> {
    let query = parse_list_query(&params)?;
    let page = state.room_service.list(&teacher.id, query).await?;

    Ok(ApiResponse::ok(RoomPageResponse {
        items: page.items.into_iter().map(Into::into).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
    }))
}

async fn show(
    teacher: AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RoomView>> {
    let id = parse_room_id(&id)?;
    let room = state.room_service.get(&teacher.id, &id).await?;
    Ok(ApiResponse::ok(room.into()))
}

async fn update(
    teacher: AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UpdateRoomInput>,
) -> AppResult<ApiResponse<RoomView>> {
    let id = parse_room_id(&id)?;
    let room = state.room_service.update(&teacher.id, &id, input).await?;
    Ok(ApiResponse::ok(room.into()))
}

async fn remove(
    teacher: AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_room_id(&id)?;
    state.room_service.delete(&teacher.id, &id).await?;
    Ok(no_content())
}

async fn create_session(
    teacher: AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CreateSessionInput>,
) -> AppResult<ApiResponse<SessionView>> {
    let room_id = parse_room_id(&id)?;
    let session = state
        .session_service
        .create(&teacher.id, &room_id, input)
        .await?;
    Ok(ApiResponse::created(session.into()))
}

async fn list_sessions(
    teacher: AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<SessionListQueryParams>,
) -> AppResult<ApiResponse<Vec<SessionView>>> {
    let room_id = parse_room_id(&id)?;
    let query = parse_session_list_query(&params)?;
    let sessions = state
        .session_service
        .list(&teacher.id, &room_id, query)
        .await?;
    Ok(ApiResponse::ok(sessions.into_iter().map(Into::into).collect()))
}
