//! Wire representations of stored records.

#![allow(missing_docs)]

use classroom_common::{AppError, AppResult};
use classroom_db::entities::{participant, poll, question, room, session, user};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherView {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for TeacherView {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub default_max_students: i32,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<room::Model> for RoomView {
    fn from(room: room::Model) -> Self {
        Self {
            id: room.id,
            owner_id: room.owner_id,
            name: room.name,
            description: room.description,
            default_max_students: room.default_max_students,
            created_at: room.created_at.to_rfc3339(),
            updated_at: room.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub room_id: String,
    pub title: String,
    pub code: String,
    pub is_active: bool,
    pub max_students: i32,
    pub participant_count: i32,
    pub start_at: String,
    pub created_at: String,
    pub closed_at: Option<String>,
}

impl From<session::Model> for SessionView {
    fn from(session: session::Model) -> Self {
        Self {
            id: session.id,
            room_id: session.room_id,
            title: session.title,
            code: session.code,
            is_active: session.is_active,
            max_students: session.max_students,
            participant_count: session.participant_count,
            start_at: session.start_at.to_rfc3339(),
            created_at: session.created_at.to_rfc3339(),
            closed_at: session.closed_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub joined_at: String,
}

impl From<participant::Model> for ParticipantView {
    fn from(participant: participant::Model) -> Self {
        Self {
            id: participant.id,
            session_id: participant.session_id,
            name: participant.name,
            joined_at: participant.joined_at.to_rfc3339(),
        }
    }
}

/// A question as shown to the room. The author id is never exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub session_id: String,
    pub text: String,
    pub is_anonymous: bool,
    pub student_name: Option<String>,
    pub upvotes: i32,
    pub timestamp: String,
}

impl From<question::Model> for QuestionView {
    fn from(question: question::Model) -> Self {
        Self {
            id: question.id,
            session_id: question.session_id,
            text: question.text,
            is_anonymous: question.is_anonymous,
            student_name: question.student_name,
            upvotes: question.upvotes,
            timestamp: question.created_at.to_rfc3339(),
        }
    }
}

impl QuestionView {
    pub fn list(questions: Vec<question::Model>) -> Vec<Self> {
        questions.into_iter().map(Self::from).collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollView {
    pub id: String,
    pub session_id: String,
    pub question: String,
    pub options: Vec<poll::PollOption>,
    pub is_active: bool,
    pub created_at: String,
    pub closed_at: Option<String>,
}

impl TryFrom<poll::Model> for PollView {
    type Error = AppError;

    fn try_from(poll: poll::Model) -> AppResult<Self> {
        let options = poll
            .decode_options()
            .map_err(|e| AppError::Internal(format!("Invalid poll options: {e}")))?;

        Ok(Self {
            id: poll.id,
            session_id: poll.session_id,
            question: poll.question,
            options,
            is_active: poll.is_active,
            created_at: poll.created_at.to_rfc3339(),
            closed_at: poll.closed_at.map(|t| t.to_rfc3339()),
        })
    }
}

impl PollView {
    pub fn list(polls: Vec<poll::Model>) -> AppResult<Vec<Self>> {
        polls.into_iter().map(Self::try_from).collect()
    }
}
