//! Participant repository.

use std::sync::Arc;

use classroom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

use crate::entities::{Participant, participant};
use crate::is_unique_violation;

/// Participant repository for database operations.
#[derive(Clone)]
pub struct ParticipantRepository {
    db: Arc<DatabaseConnection>,
}

impl ParticipantRepository {
    /// Create a new participant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a participant by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<participant::Model>> {
        Participant::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a participant by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<participant::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Participant not found: {id}")))
    }

    /// Find the participant registered under `name` in a session.
    pub async fn find_by_session_and_name(
        &self,
        session_id: &str,
        name: &str,
    ) -> AppResult<Option<participant::Model>> {
        Participant::find()
            .filter(participant::Column::SessionId.eq(session_id))
            .filter(participant::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new participant.
    ///
    /// A name already taken in the session yields `Conflict`.
    pub async fn create(&self, model: participant::ActiveModel) -> AppResult<participant::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Name already taken in this session".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }
}
