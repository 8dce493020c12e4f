//! Question repository.

use std::sync::Arc;

use classroom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, sea_query::Expr,
};

use crate::entities::{Question, question};

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a question by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a question by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<question::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question not found: {id}")))
    }

    /// All questions of a session, most upvoted first, newest first among ties.
    pub async fn find_by_session(&self, session_id: &str) -> AppResult<Vec<question::Model>> {
        Question::find()
            .filter(question::Column::SessionId.eq(session_id))
            .order_by(question::Column::Upvotes, Order::Desc)
            .order_by(question::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new question.
    pub async fn create(&self, model: question::ActiveModel) -> AppResult<question::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment upvotes atomically.
    pub async fn increment_upvotes(&self, id: &str) -> AppResult<()> {
        let result = Question::update_many()
            .col_expr(
                question::Column::Upvotes,
                Expr::col(question::Column::Upvotes).add(1),
            )
            .filter(question::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Question not found: {id}")));
        }

        Ok(())
    }
}
