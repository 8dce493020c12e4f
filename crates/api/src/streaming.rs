//! WebSocket session channel.
//!
//! Clients connect to `/streaming?token=...`, then send `join-room` /
//! `leave-room` messages naming a session. Every [`SessionEvent`] published
//! by the services is fanned out over one bounded broadcast channel; each
//! connection forwards only events of the sessions it joined.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use classroom_common::{AppResult, parse_id};
use classroom_core::{Claims, EventPublisher, SessionEvent};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::middleware::AppState;
use crate::views::{ParticipantView, PollView, QuestionView, SessionView};

/// Events buffered per receiver before a slow client starts skipping.
const CHANNEL_CAPACITY: usize = 1024;

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token (teacher or participant).
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    pub session_id: String,
}

/// Client-to-server message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinRoom(RoomRef),
    LeaveRoom(RoomRef),
}

/// Server-to-client message.
#[derive(Debug, Serialize)]
#[serde(
    tag = "type",
    content = "body",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Acknowledges a `join-room`.
    Joined { session_id: String },
    /// Acknowledges a `leave-room`.
    Left { session_id: String },
    /// A request could not be honoured.
    Error { message: String },
    /// A session event.
    Event {
        session_id: String,
        #[serde(rename = "type")]
        event_type: String,
        body: serde_json::Value,
    },
}

/// One serialized event addressed to a session.
#[derive(Debug)]
pub struct SessionBroadcast {
    pub session_id: String,
    pub payload: String,
}

/// Shared state for streaming.
#[derive(Clone)]
pub struct StreamingState {
    tx: broadcast::Sender<Arc<SessionBroadcast>>,
}

impl StreamingState {
    /// Create a new streaming state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to every session's events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SessionBroadcast>> {
        self.tx.subscribe()
    }

    /// Number of open connections.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StreamingState {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for StreamingState {
    async fn publish(&self, event: SessionEvent) -> AppResult<()> {
        let message = event_to_server_message(event)?;
        let ServerMessage::Event { session_id, .. } = &message else {
            return Ok(());
        };
        let session_id = session_id.clone();
        let payload = serde_json::to_string(&message)
            .map_err(|e| classroom_common::AppError::Internal(e.to_string()))?;

        // No receivers just means nobody is watching.
        let _ = self.tx.send(Arc::new(SessionBroadcast {
            session_id,
            payload,
        }));
        Ok(())
    }
}

/// Convert a session event to a server message.
fn event_to_server_message(event: SessionEvent) -> AppResult<ServerMessage> {
    let session_id = event.session_id().to_string();
    let event_type = event.kind().to_string();

    let body = match event {
        SessionEvent::ParticipantJoined {
            participant,
            participant_count,
            ..
        } => serde_json::json!({
            "participant": ParticipantView::from(participant),
            "participantCount": participant_count,
        }),
        SessionEvent::QuestionAsked { question, .. } => {
            serde_json::json!({ "question": QuestionView::from(question) })
        }
        SessionEvent::QuestionUpvoted {
            question_id,
            questions,
            ..
        } => serde_json::json!({
            "questionId": question_id,
            "questions": QuestionView::list(questions),
        }),
        SessionEvent::PollCreated { poll, .. }
        | SessionEvent::PollUpdated { poll, .. }
        | SessionEvent::PollClosed { poll, .. } => {
            serde_json::json!({ "poll": PollView::try_from(poll)? })
        }
        SessionEvent::SessionClosed { session } => {
            serde_json::json!({ "session": SessionView::from(session) })
        }
    };

    Ok(ServerMessage::Event {
        session_id,
        event_type,
        body,
    })
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let claims = query
        .token
        .as_deref()
        .and_then(|token| state.tokens.verify_claims(token).ok());

    ws.on_upgrade(move |socket| handle_socket(socket, claims, state))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, claims: Option<Claims>, state: AppState) {
    let connection_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.streaming.subscribe();
    let mut joined: HashSet<String> = HashSet::new();

    info!(%connection_id, authenticated = claims.is_some(), "Streaming connection established");

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let Some(msg) = msg else { break };
                match msg {
                    Ok(Message::Text(text)) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handle_client_message(client_msg, claims.as_ref(), &state, &mut joined).await
                            }
                            Err(e) => {
                                debug!(%connection_id, error = %e, "Failed to parse client message");
                                ServerMessage::Error { message: "Unrecognized message".to_string() }
                            }
                        };
                        let json = serde_json::to_string(&reply).unwrap_or_default();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!(%connection_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if joined.contains(&event.session_id)
                            && sender.send(Message::Text(event.payload.clone().into())).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(%connection_id, skipped, "Streaming client lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!(%connection_id, "Streaming connection closed");
}

/// Handle a client message.
async fn handle_client_message(
    msg: ClientMessage,
    claims: Option<&Claims>,
    state: &AppState,
    joined: &mut HashSet<String>,
) -> ServerMessage {
    match msg {
        ClientMessage::JoinRoom(room) => {
            let Some(claims) = claims else {
                return ServerMessage::Error {
                    message: "Authentication required".to_string(),
                };
            };
            let session_id = match parse_id(&room.session_id) {
                Ok(id) => id,
                Err(e) => return ServerMessage::Error { message: e.to_string() },
            };

            match state.session_service.get(claims, &session_id).await {
                Ok(session) => {
                    joined.insert(session.id.clone());
                    debug!(session_id = %session.id, "Joined session room");
                    ServerMessage::Joined {
                        session_id: session.id,
                    }
                }
                Err(e) => ServerMessage::Error { message: e.to_string() },
            }
        }
        ClientMessage::LeaveRoom(room) => {
            let session_id = room.session_id.to_lowercase();
            joined.remove(&session_id);
            ServerMessage::Left { session_id }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use classroom_db::entities::{poll, question};
    use serde_json::json;

    const SESSION: &str = "ccccccccccccccccccccccc1";

    fn create_test_question() -> question::Model {
        question::Model {
            id: "ddddddddddddddddddddddd1".to_string(),
            session_id: SESSION.to_string(),
            participant_id: Some("eeeeeeeeeeeeeeeeeeeeeee1".to_string()),
            text: "When is the exam?".to_string(),
            is_anonymous: true,
            student_name: None,
            upvotes: 0,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_client_messages_parse() {
        let join: ClientMessage =
            serde_json::from_str(&format!(r#"{{"type":"join-room","body":{{"sessionId":"{SESSION}"}}}}"#))
                .unwrap();
        assert!(matches!(join, ClientMessage::JoinRoom(RoomRef { session_id }) if session_id == SESSION));

        let leave: ClientMessage =
            serde_json::from_str(&format!(r#"{{"type":"leave-room","body":{{"sessionId":"{SESSION}"}}}}"#))
                .unwrap();
        assert!(matches!(leave, ClientMessage::LeaveRoom(_)));
    }

    #[test]
    fn test_server_message_shape() {
        let message = event_to_server_message(SessionEvent::QuestionAsked {
            session_id: SESSION.to_string(),
            question: create_test_question(),
        })
        .unwrap();

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "event");
        assert_eq!(value["body"]["sessionId"], SESSION);
        assert_eq!(value["body"]["type"], "questionAsked");
        assert_eq!(value["body"]["body"]["question"]["isAnonymous"], true);
        assert!(value["body"]["body"]["question"].get("participantId").is_none());

        assert_eq!(
            serde_json::to_value(ServerMessage::Joined { session_id: SESSION.to_string() }).unwrap(),
            json!({ "type": "joined", "body": { "sessionId": SESSION } })
        );
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let streaming = StreamingState::new();
        let mut rx = streaming.subscribe();

        let poll = poll::Model {
            id: "fffffffffffffffffffffff1".to_string(),
            session_id: SESSION.to_string(),
            question: "Ready?".to_string(),
            options: json!([{ "text": "Yes", "votes": 1 }, { "text": "No", "votes": 0 }]),
            is_active: true,
            created_at: Utc::now().into(),
            closed_at: None,
        };
        streaming
            .publish(SessionEvent::PollUpdated {
                session_id: SESSION.to_string(),
                poll,
            })
            .await
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.session_id, SESSION);
        let payload: serde_json::Value = serde_json::from_str(&received.payload).unwrap();
        assert_eq!(payload["body"]["body"]["poll"]["options"][0]["votes"], 1);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let streaming = StreamingState::new();
        assert_eq!(streaming.receiver_count(), 0);
        streaming
            .publish(SessionEvent::QuestionAsked {
                session_id: SESSION.to_string(),
                question: create_test_question(),
            })
            .await
            .unwrap();
    }
}
