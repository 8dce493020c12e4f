//! Session repository.

use std::sync::Arc;

use chrono::Utc;
use classroom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};

use crate::entities::{Poll, Session, poll, session};
use crate::is_unique_violation;

/// Repository for session operations.
#[derive(Clone)]
pub struct SessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find session by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<session::Model>> {
        Session::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get session by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<session::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
    }

    /// Find session by join code.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<session::Model>> {
        Session::find()
            .filter(session::Column::Code.eq(code))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get session by join code, returning error if not found.
    pub async fn get_by_code(&self, code: &str) -> AppResult<session::Model> {
        self.find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session not found for code: {code}")))
    }

    /// Find sessions of a room, newest first.
    ///
    /// `active` of `None` returns both active and closed sessions.
    pub async fn find_by_room(
        &self,
        room_id: &str,
        active: Option<bool>,
        limit: u64,
    ) -> AppResult<Vec<session::Model>> {
        let mut query = Session::find().filter(session::Column::RoomId.eq(room_id));

        if let Some(is_active) = active {
            query = query.filter(session::Column::IsActive.eq(is_active));
        }

        query
            .order_by(session::Column::CreatedAt, Order::Desc)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new session.
    pub async fn create(&self, model: session::ActiveModel) -> AppResult<session::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Join code already in use".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Close an active session together with its open polls.
    ///
    /// Both updates commit or roll back together. Returns the number of polls
    /// closed, or `None` if the session was already closed.
    pub async fn close(&self, id: &str) -> AppResult<Option<u64>> {
        let db_err = |e: sea_orm::DbErr| AppError::Database(e.to_string());
        let now = Utc::now();

        let txn = self.db.begin().await.map_err(db_err)?;

        let closed = Session::update_many()
            .col_expr(session::Column::IsActive, Expr::value(false))
            .col_expr(session::Column::ClosedAt, Expr::value(now))
            .filter(session::Column::Id.eq(id))
            .filter(session::Column::IsActive.eq(true))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if closed.rows_affected == 0 {
            return Ok(None);
        }

        let polls = Poll::update_many()
            .col_expr(poll::Column::IsActive, Expr::value(false))
            .col_expr(poll::Column::ClosedAt, Expr::value(now))
            .filter(poll::Column::SessionId.eq(id))
            .filter(poll::Column::IsActive.eq(true))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        Ok(Some(polls.rows_affected))
    }

    /// Take one seat in an active session.
    ///
    /// The increment and the capacity check happen in one statement, so
    /// concurrent joins cannot push `participant_count` past `max_students`.
    /// Returns `false` if the session is closed or full.
    pub async fn try_reserve_seat(&self, id: &str) -> AppResult<bool> {
        let result = Session::update_many()
            .col_expr(
                session::Column::ParticipantCount,
                Expr::col(session::Column::ParticipantCount).add(1),
            )
            .filter(session::Column::Id.eq(id))
            .filter(session::Column::IsActive.eq(true))
            .filter(
                Expr::col(session::Column::ParticipantCount)
                    .lt(Expr::col(session::Column::MaxStudents)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Give back a seat taken by [`Self::try_reserve_seat`].
    pub async fn release_seat(&self, id: &str) -> AppResult<()> {
        Session::update_many()
            .col_expr(
                session::Column::ParticipantCount,
                Expr::col(session::Column::ParticipantCount).sub(1),
            )
            .filter(session::Column::Id.eq(id))
            .filter(session::Column::ParticipantCount.gt(0))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
