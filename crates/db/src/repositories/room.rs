//! Room repository.

use std::sync::Arc;

use classroom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::{Room, room};

/// Repository for room operations.
#[derive(Clone)]
pub struct RoomRepository {
    db: Arc<DatabaseConnection>,
}

impl RoomRepository {
    /// Create a new room repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find room by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<room::Model>> {
        Room::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get room by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<room::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room not found: {id}")))
    }

    /// Find rooms owned by a teacher, newest first.
    pub async fn find_by_owner(
        &self,
        owner_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<room::Model>> {
        Room::find()
            .filter(room::Column::OwnerId.eq(owner_id))
            .order_by(room::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count rooms owned by a teacher.
    pub async fn count_by_owner(&self, owner_id: &str) -> AppResult<u64> {
        Room::find()
            .filter(room::Column::OwnerId.eq(owner_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new room.
    pub async fn create(&self, model: room::ActiveModel) -> AppResult<room::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a room.
    pub async fn update(&self, model: room::ActiveModel) -> AppResult<room::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a room (sessions cascade).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Room::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_room(id: &str, owner_id: &str, name: &str) -> room::Model {
        room::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            description: None,
            default_max_students: 30,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_owner() {
        let rooms = vec![
            create_test_room("aaaaaaaaaaaaaaaaaaaaaaa1", "owner1", "Biology"),
            create_test_room("aaaaaaaaaaaaaaaaaaaaaaa2", "owner1", "Chemistry"),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rooms.clone()])
                .into_connection(),
        );

        let repo = RoomRepository::new(db);
        let result = repo.find_by_owner("owner1", 10, 0).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[1].name, "Chemistry");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<room::Model>::new()])
                .into_connection(),
        );

        let repo = RoomRepository::new(db);
        let result = repo.get_by_id("aaaaaaaaaaaaaaaaaaaaaaa1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
