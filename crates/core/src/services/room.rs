//! Room service.

use chrono::Utc;
use classroom_common::{AppError, AppResult, IdGenerator};
use classroom_db::{entities::room, repositories::RoomRepository};
use sea_orm::Set;

use crate::schema::{self, CreateRoomInput, ListQuery, UpdateRoomInput};

/// Room service for business logic.
#[derive(Clone)]
pub struct RoomService {
    room_repo: RoomRepository,
    id_gen: IdGenerator,
}

/// One page of a teacher's rooms.
#[derive(Debug, Clone)]
pub struct RoomPage {
    pub items: Vec<room::Model>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl RoomService {
    /// Create a new room service.
    #[must_use]
    pub const fn new(room_repo: RoomRepository) -> Self {
        Self {
            room_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a room owned by `owner_id`.
    pub async fn create(&self, owner_id: &str, input: CreateRoomInput) -> AppResult<room::Model> {
        let new_room = schema::create_room(input)?;

        let model = room::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner_id.to_string()),
            name: Set(new_room.name),
            description: Set(new_room.description),
            default_max_students: Set(new_room.default_max_students),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let room = self.room_repo.create(model).await?;
        tracing::debug!(room_id = %room.id, owner_id, "Room created");

        Ok(room)
    }

    /// List the teacher's rooms, newest first.
    pub async fn list(&self, owner_id: &str, query: ListQuery) -> AppResult<RoomPage> {
        let items = self
            .room_repo
            .find_by_owner(owner_id, query.limit, query.offset())
            .await?;
        let total = self.room_repo.count_by_owner(owner_id).await?;

        Ok(RoomPage {
            items,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    /// Get a room the teacher owns.
    pub async fn get(&self, owner_id: &str, id: &str) -> AppResult<room::Model> {
        let room = self.room_repo.get_by_id(id).await?;
        ensure_owner(&room, owner_id)?;
        Ok(room)
    }

    /// Apply a partial update.
    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        input: UpdateRoomInput,
    ) -> AppResult<room::Model> {
        let patch = schema::update_room(input)?;
        let room = self.get(owner_id, id).await?;

        if patch.is_empty() {
            return Ok(room);
        }

        let mut active: room::ActiveModel = room.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(capacity) = patch.default_max_students {
            active.default_max_students = Set(capacity);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.room_repo.update(active).await
    }

    /// Delete a room and, by cascade, its sessions.
    pub async fn delete(&self, owner_id: &str, id: &str) -> AppResult<()> {
        self.get(owner_id, id).await?;
        self.room_repo.delete(id).await?;
        tracing::info!(room_id = id, owner_id, "Room deleted");
        Ok(())
    }
}

fn ensure_owner(room: &room::Model, owner_id: &str) -> AppResult<()> {
    if room.owner_id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden("Room belongs to another teacher".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    const OWNER: &str = "aaaaaaaaaaaaaaaaaaaaaaa1";
    const ROOM: &str = "bbbbbbbbbbbbbbbbbbbbbbb1";

    fn create_test_room(owner_id: &str) -> room::Model {
        room::Model {
            id: ROOM.to_string(),
            owner_id: owner_id.to_string(),
            name: "Biology".to_string(),
            description: None,
            default_max_students: 30,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> RoomService {
        RoomService::new(RoomRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_create_rejects_short_name() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .create(
                OWNER,
                CreateRoomInput {
                    name: "ab".to_string(),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::InvalidFields(fields)) if fields.contains("name")));
    }

    #[tokio::test]
    async fn test_create_applies_default_capacity() {
        let room = create_test_room(OWNER);
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[room]]),
        );

        let created = service
            .create(
                OWNER,
                CreateRoomInput {
                    name: "Biology".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(created.default_max_students, 30);
    }

    #[tokio::test]
    async fn test_get_other_teachers_room_is_forbidden() {
        let room = create_test_room("ccccccccccccccccccccccc1");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[room]]),
        );

        let result = service.get(OWNER, ROOM).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_empty_update_returns_room_unchanged() {
        let room = create_test_room(OWNER);
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[room.clone()]]),
        );

        let updated = service
            .update(OWNER, ROOM, UpdateRoomInput::default())
            .await
            .unwrap();

        assert_eq!(updated, room);
    }

    #[tokio::test]
    async fn test_update_sets_fields() {
        let room = create_test_room(OWNER);
        let renamed = room::Model {
            name: "Advanced Biology".to_string(),
            updated_at: Some(Utc::now().into()),
            ..room.clone()
        };
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[room]])
                .append_query_results([[renamed]]),
        );

        let updated = service
            .update(
                OWNER,
                ROOM,
                UpdateRoomInput {
                    name: Some("Advanced Biology".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Advanced Biology");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_checks_owner_first() {
        let room = create_test_room(OWNER);
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[room]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        service.delete(OWNER, ROOM).await.unwrap();
    }
}
