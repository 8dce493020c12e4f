//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, PollVote, poll, poll_vote};
use crate::is_unique_violation;
use chrono::Utc;
use classroom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {id}")))
    }

    /// Polls of a session, newest first.
    pub async fn find_by_session(&self, session_id: &str) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::SessionId.eq(session_id))
            .order_by(poll::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new poll.
    pub async fn create(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark an active poll closed, stamping `closed_at`.
    ///
    /// Returns `false` if the poll was already closed.
    pub async fn close(&self, id: &str) -> AppResult<bool> {
        let result = Poll::update_many()
            .col_expr(poll::Column::IsActive, Expr::value(false))
            .col_expr(poll::Column::ClosedAt, Expr::value(Utc::now()))
            .filter(poll::Column::Id.eq(id))
            .filter(poll::Column::IsActive.eq(true))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Store a vote and bump the chosen option's count in one transaction.
    ///
    /// The poll row is locked for the duration, so concurrent votes never
    /// lose an increment. Fails with `Conflict` if the poll closed meanwhile
    /// or the participant already voted.
    pub async fn record_vote(
        &self,
        vote_id: String,
        poll_id: &str,
        participant_id: &str,
        choice: i32,
    ) -> AppResult<poll::Model> {
        let db_err = |e: sea_orm::DbErr| AppError::Database(e.to_string());

        let txn = self.db.begin().await.map_err(db_err)?;

        let poll = Poll::find_by_id(poll_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {poll_id}")))?;

        if !poll.is_active {
            return Err(AppError::Conflict("Poll is closed".to_string()));
        }

        // Votes on this poll serialize on the row lock, so this check is exact.
        let already_voted = PollVote::find()
            .filter(poll_vote::Column::PollId.eq(poll_id))
            .filter(poll_vote::Column::ParticipantId.eq(participant_id))
            .count(&txn)
            .await
            .map_err(db_err)?
            > 0;
        if already_voted {
            return Err(AppError::Conflict("Already voted on this poll".to_string()));
        }

        let options = poll
            .decode_options()
            .map_err(|e| AppError::Internal(format!("Invalid poll options: {e}")))?;
        let options = poll::tally(options, choice)
            .ok_or_else(|| AppError::BadRequest("Invalid option".to_string()))?;

        let vote = poll_vote::ActiveModel {
            id: Set(vote_id),
            poll_id: Set(poll_id.to_string()),
            participant_id: Set(participant_id.to_string()),
            choice: Set(choice),
            created_at: Set(Utc::now().into()),
        };
        vote.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Already voted on this poll".to_string())
            } else {
                db_err(e)
            }
        })?;

        let options = serde_json::to_value(&options)
            .map_err(|e| AppError::Internal(format!("Invalid poll options: {e}")))?;
        let mut active = poll.into_active_model();
        active.options = Set(options);
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        Ok(updated)
    }
}

/// Poll vote repository for database operations.
#[derive(Clone)]
pub struct PollVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl PollVoteRepository {
    /// Create a new poll vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check if a participant has voted on a poll.
    pub async fn has_voted(&self, poll_id: &str, participant_id: &str) -> AppResult<bool> {
        let count = PollVote::find()
            .filter(poll_vote::Column::PollId.eq(poll_id))
            .filter(poll_vote::Column::ParticipantId.eq(participant_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    const POLL: &str = "fffffffffffffffffffffff1";
    const PARTICIPANT: &str = "eeeeeeeeeeeeeeeeeeeeeee1";

    fn create_test_poll(is_active: bool, options: serde_json::Value) -> poll::Model {
        poll::Model {
            id: POLL.to_string(),
            session_id: "ccccccccccccccccccccccc1".to_string(),
            question: "Tabs or spaces?".to_string(),
            options,
            is_active,
            created_at: Utc::now().into(),
            closed_at: None,
        }
    }

    fn create_test_vote(choice: i32) -> poll_vote::Model {
        poll_vote::Model {
            id: "ggggggggggggggggggggggg1".to_string(),
            poll_id: POLL.to_string(),
            participant_id: PARTICIPANT.to_string(),
            choice,
            created_at: Utc::now().into(),
        }
    }

    fn vote_count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }
    }

    fn two_options(first: i64, second: i64) -> serde_json::Value {
        json!([{ "text": "Tabs", "votes": first }, { "text": "Spaces", "votes": second }])
    }

    #[tokio::test]
    async fn test_record_vote_stores_and_returns_tally() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_poll(true, two_options(4, 1))]])
                .append_query_results([[vote_count(0)]])
                .append_query_results([[create_test_vote(1)]])
                .append_query_results([[create_test_poll(true, two_options(4, 2))]])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let poll = repo
            .record_vote("ggggggggggggggggggggggg1".to_string(), POLL, PARTICIPANT, 1)
            .await
            .unwrap();

        let options = poll.decode_options().unwrap();
        assert_eq!(options[0].text, "Tabs");
        assert_eq!(options[0].votes, 4);
        assert_eq!(options[1].text, "Spaces");
        assert_eq!(options[1].votes, 2);
    }

    #[tokio::test]
    async fn test_record_vote_twice_conflicts_inside_transaction() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_poll(true, two_options(1, 0))]])
                .append_query_results([[vote_count(1)]])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo
            .record_vote("ggggggggggggggggggggggg2".to_string(), POLL, PARTICIPANT, 0)
            .await;

        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg.contains("Already voted")));
    }

    #[tokio::test]
    async fn test_record_vote_on_closed_poll_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_poll(false, two_options(1, 0))]])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo
            .record_vote("ggggggggggggggggggggggg2".to_string(), POLL, PARTICIPANT, 0)
            .await;

        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg.contains("closed")));
    }

    #[tokio::test]
    async fn test_has_voted() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote_count(1)]])
                .append_query_results([[vote_count(0)]])
                .into_connection(),
        );

        let repo = PollVoteRepository::new(db);
        assert!(repo.has_voted(POLL, PARTICIPANT).await.unwrap());
        assert!(!repo.has_voted(POLL, "eeeeeeeeeeeeeeeeeeeeeee2").await.unwrap());
    }
}
