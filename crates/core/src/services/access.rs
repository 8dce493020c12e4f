//! Ownership and membership checks shared by the session-scoped services.

use classroom_common::{AppError, AppResult};
use classroom_db::{
    entities::session,
    repositories::{RoomRepository, SessionRepository},
};

use super::token::Claims;

/// Resolves whether a caller may act on a session.
#[derive(Clone)]
pub struct SessionAccess {
    session_repo: SessionRepository,
    room_repo: RoomRepository,
}

impl SessionAccess {
    #[must_use]
    pub const fn new(session_repo: SessionRepository, room_repo: RoomRepository) -> Self {
        Self {
            session_repo,
            room_repo,
        }
    }

    /// Load a session the teacher owns through its room.
    pub async fn owned_session(
        &self,
        teacher_id: &str,
        session_id: &str,
    ) -> AppResult<session::Model> {
        let session = self.session_repo.get_by_id(session_id).await?;
        let room = self.room_repo.get_by_id(&session.room_id).await?;

        if room.owner_id != teacher_id {
            return Err(AppError::Forbidden(
                "Session belongs to another teacher".to_string(),
            ));
        }

        Ok(session)
    }

    /// Load a session the participant was admitted to.
    pub async fn joined_session(
        &self,
        participant_session_id: &str,
        session_id: &str,
    ) -> AppResult<session::Model> {
        if participant_session_id != session_id {
            return Err(AppError::Forbidden(
                "Not a participant of this session".to_string(),
            ));
        }

        self.session_repo.get_by_id(session_id).await
    }

    /// Load a session visible to the caller: its owner or one of its participants.
    pub async fn visible_session(
        &self,
        claims: &Claims,
        session_id: &str,
    ) -> AppResult<session::Model> {
        match claims {
            Claims::Teacher { sub } => self.owned_session(sub, session_id).await,
            Claims::Participant { sid, .. } => self.joined_session(sid, session_id).await,
        }
    }
}
