//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p classroom-db --features test-utils --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `classroom_test`)
//!   `TEST_DB_PASSWORD` (default: `classroom_test`)
//!   `TEST_DB_NAME` (default: `classroom_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use classroom_common::IdGenerator;
use classroom_db::entities::{room, session, user};
use classroom_db::repositories::{RoomRepository, SessionRepository, UserRepository};
use classroom_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{Set, SqlxPostgresConnector};

/// Seed a teacher, a room and a session with the given capacity.
async fn seed_session(db: &TestDatabase, max_students: i32) -> (SessionRepository, String) {
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.connection().get_postgres_connection_pool().clone(),
    ));
    let id_gen = IdGenerator::new();

    let user_id = id_gen.generate();
    UserRepository::new(Arc::clone(&conn))
        .create(user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(format!("teacher_{}", &user_id[16..])),
            password_hash: Set("$argon2id$stub".to_string()),
            name: Set(None),
            created_at: Set(Utc::now().into()),
        })
        .await
        .unwrap();

    let room_id = id_gen.generate();
    RoomRepository::new(Arc::clone(&conn))
        .create(room::ActiveModel {
            id: Set(room_id.clone()),
            owner_id: Set(user_id),
            name: Set("Physics".to_string()),
            description: Set(None),
            default_max_students: Set(max_students),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
        .unwrap();

    let session_id = id_gen.generate();
    let sessions = SessionRepository::new(conn);
    sessions
        .create(session::ActiveModel {
            id: Set(session_id.clone()),
            room_id: Set(room_id),
            title: Set("Lab".to_string()),
            code: Set(session_id[18..].to_uppercase()),
            is_active: Set(true),
            max_students: Set(max_students),
            participant_count: Set(0),
            start_at: Set(Utc::now().into()),
            created_at: Set(Utc::now().into()),
            closed_at: Set(None),
        })
        .await
        .unwrap();

    (sessions, session_id)
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection_and_migrations() {
    let result = TestDatabase::with_config(TestDbConfig::default()).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_seat_reservations_respect_capacity() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let (sessions, session_id) = seed_session(&db, 3).await;

    let attempts = (0..10).map(|_| {
        let sessions = sessions.clone();
        let session_id = session_id.clone();
        tokio::spawn(async move { sessions.try_reserve_seat(&session_id).await.unwrap() })
    });

    let mut admitted = 0;
    for attempt in attempts {
        if attempt.await.unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 3);
    let session = sessions.get_by_id(&session_id).await.unwrap();
    assert_eq!(session.participant_count, 3);

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_closed_session_rejects_seats() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let (sessions, session_id) = seed_session(&db, 30).await;

    assert_eq!(sessions.close(&session_id).await.unwrap(), Some(0));
    assert_eq!(sessions.close(&session_id).await.unwrap(), None);
    assert!(!sessions.try_reserve_seat(&session_id).await.unwrap());

    let session = sessions.get_by_id(&session_id).await.unwrap();
    assert!(!session.is_active);
    assert!(session.closed_at.is_some());

    db.cleanup().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
