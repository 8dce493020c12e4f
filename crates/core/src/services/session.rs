//! Session service: opening, listing, closing and joining sessions.

use chrono::Utc;
use classroom_common::{AppError, AppResult, IdGenerator};
use classroom_db::{
    entities::{participant, session},
    repositories::{ParticipantRepository, RoomRepository, SessionRepository},
};
use rand::Rng;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::{
    access::SessionAccess,
    event_publisher::{EventPublisherService, SessionEvent, publish_or_warn},
    token::{Claims, TokenService},
};
use crate::schema::{self, CreateSessionInput, SessionListQuery};

/// Characters used in join codes. Look-alikes (0/O, 1/I/L) are left out.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;
const CODE_ATTEMPTS: usize = 5;

/// Generate a random join code.
#[must_use]
pub fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
        .collect()
}

/// Session service for business logic.
#[derive(Clone)]
pub struct SessionService {
    session_repo: SessionRepository,
    room_repo: RoomRepository,
    participant_repo: ParticipantRepository,
    access: SessionAccess,
    tokens: TokenService,
    events: EventPublisherService,
    id_gen: IdGenerator,
}

/// Input for joining a session.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JoinInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// A student admitted to a session.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub session: session::Model,
    pub participant: participant::Model,
    pub token: String,
    /// `false` when an existing participant re-joined under the same name.
    pub newly_joined: bool,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub fn new(
        session_repo: SessionRepository,
        room_repo: RoomRepository,
        participant_repo: ParticipantRepository,
        tokens: TokenService,
        events: EventPublisherService,
    ) -> Self {
        Self {
            access: SessionAccess::new(session_repo.clone(), room_repo.clone()),
            session_repo,
            room_repo,
            participant_repo,
            tokens,
            events,
            id_gen: IdGenerator::new(),
        }
    }

    /// Open a session under a room the teacher owns.
    pub async fn create(
        &self,
        teacher_id: &str,
        room_id: &str,
        input: CreateSessionInput,
    ) -> AppResult<session::Model> {
        let new_session = schema::create_session(input)?;

        let room = self.room_repo.get_by_id(room_id).await?;
        if room.owner_id != teacher_id {
            return Err(AppError::Forbidden(
                "Room belongs to another teacher".to_string(),
            ));
        }

        let max_students = new_session
            .max_students
            .unwrap_or(room.default_max_students);

        for _ in 0..CODE_ATTEMPTS {
            let model = session::ActiveModel {
                id: Set(self.id_gen.generate()),
                room_id: Set(room.id.clone()),
                title: Set(new_session.title.clone()),
                code: Set(generate_join_code()),
                is_active: Set(true),
                max_students: Set(max_students),
                participant_count: Set(0),
                start_at: Set(new_session.start_at.into()),
                created_at: Set(Utc::now().into()),
                closed_at: Set(None),
            };

            match self.session_repo.create(model).await {
                Ok(session) => {
                    tracing::info!(
                        session_id = %session.id,
                        room_id = %room.id,
                        code = %session.code,
                        max_students,
                        "Session opened"
                    );
                    return Ok(session);
                }
                Err(AppError::Conflict(_)) => {
                    tracing::debug!(room_id = %room.id, "Join code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Internal(
            "Could not allocate a unique join code".to_string(),
        ))
    }

    /// List sessions of a room the teacher owns.
    pub async fn list(
        &self,
        teacher_id: &str,
        room_id: &str,
        query: SessionListQuery,
    ) -> AppResult<Vec<session::Model>> {
        let room = self.room_repo.get_by_id(room_id).await?;
        if room.owner_id != teacher_id {
            return Err(AppError::Forbidden(
                "Room belongs to another teacher".to_string(),
            ));
        }

        self.session_repo
            .find_by_room(room_id, query.active, query.limit)
            .await
    }

    /// Get a session visible to the caller.
    pub async fn get(&self, claims: &Claims, id: &str) -> AppResult<session::Model> {
        self.access.visible_session(claims, id).await
    }

    /// Look up an active or closed session by join code.
    pub async fn get_by_code(&self, code: &str) -> AppResult<session::Model> {
        self.session_repo.get_by_code(&normalize_code(code)).await
    }

    /// Close a session and every poll still open in it.
    ///
    /// Closing is one-way; closing twice fails with `Conflict`.
    pub async fn close(&self, teacher_id: &str, id: &str) -> AppResult<session::Model> {
        self.access.owned_session(teacher_id, id).await?;

        let Some(polls_closed) = self.session_repo.close(id).await? else {
            return Err(AppError::Conflict("Session is already closed".to_string()));
        };

        let session = self.session_repo.get_by_id(id).await?;
        tracing::info!(session_id = id, polls_closed, "Session closed");

        publish_or_warn(
            &self.events,
            SessionEvent::SessionClosed {
                session: session.clone(),
            },
        )
        .await;

        Ok(session)
    }

    /// Admit a student by join code.
    ///
    /// A name already present in the session returns that participant and
    /// does not take another seat.
    pub async fn join(&self, code: &str, input: JoinInput) -> AppResult<JoinOutcome> {
        let input = JoinInput {
            name: input.name.trim().to_string(),
        };
        input.validate()?;

        let session = self.get_by_code(code).await?;
        if !session.is_active {
            return Err(AppError::Conflict("Session is closed".to_string()));
        }

        if let Some(participant) = self
            .participant_repo
            .find_by_session_and_name(&session.id, &input.name)
            .await?
        {
            tracing::debug!(session_id = %session.id, participant_id = %participant.id, "Participant re-joined");
            return self.admitted(session, participant, false);
        }

        if !self.session_repo.try_reserve_seat(&session.id).await? {
            let current = self.session_repo.get_by_id(&session.id).await?;
            return Err(if current.is_active {
                AppError::Conflict("Session is full".to_string())
            } else {
                AppError::Conflict("Session is closed".to_string())
            });
        }

        let model = participant::ActiveModel {
            id: Set(self.id_gen.generate()),
            session_id: Set(session.id.clone()),
            name: Set(input.name.clone()),
            joined_at: Set(Utc::now().into()),
        };

        let participant = match self.participant_repo.create(model).await {
            Ok(participant) => participant,
            Err(err) => {
                self.session_repo.release_seat(&session.id).await?;
                if !matches!(err, AppError::Conflict(_)) {
                    return Err(err);
                }
                // Lost a race against a join under the same name.
                let existing = self
                    .participant_repo
                    .find_by_session_and_name(&session.id, &input.name)
                    .await?
                    .ok_or(err)?;
                return self.admitted(session, existing, false);
            }
        };

        let session = self.session_repo.get_by_id(&session.id).await?;
        tracing::info!(
            session_id = %session.id,
            participant_id = %participant.id,
            participant_count = session.participant_count,
            "Participant joined"
        );

        publish_or_warn(
            &self.events,
            SessionEvent::ParticipantJoined {
                session_id: session.id.clone(),
                participant: participant.clone(),
                participant_count: session.participant_count,
            },
        )
        .await;

        self.admitted(session, participant, true)
    }

    fn admitted(
        &self,
        session: session::Model,
        participant: participant::Model,
        newly_joined: bool,
    ) -> AppResult<JoinOutcome> {
        let token = self.tokens.issue_claims(&Claims::Participant {
            sub: participant.id.clone(),
            sid: session.id.clone(),
        })?;

        Ok(JoinOutcome {
            session,
            participant,
            token,
            newly_joined,
        })
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::event_publisher::{NoOpEventPublisher, testing::RecordingPublisher};
    use classroom_db::entities::room;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    const TEACHER: &str = "aaaaaaaaaaaaaaaaaaaaaaa1";
    const ROOM: &str = "bbbbbbbbbbbbbbbbbbbbbbb1";
    const SESSION: &str = "ccccccccccccccccccccccc1";

    fn tokens() -> TokenService {
        TokenService::new("session-test-secret-0123456789abcdef", 3600).unwrap()
    }

    fn create_test_room(owner_id: &str) -> room::Model {
        room::Model {
            id: ROOM.to_string(),
            owner_id: owner_id.to_string(),
            name: "Biology".to_string(),
            description: None,
            default_max_students: 25,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_session(is_active: bool, participant_count: i32, max_students: i32) -> session::Model {
        session::Model {
            id: SESSION.to_string(),
            room_id: ROOM.to_string(),
            title: "Week 1".to_string(),
            code: "ABC234".to_string(),
            is_active,
            max_students,
            participant_count,
            start_at: Utc::now().into(),
            created_at: Utc::now().into(),
            closed_at: if is_active { None } else { Some(Utc::now().into()) },
        }
    }

    fn create_test_participant(id: &str, name: &str) -> participant::Model {
        participant::Model {
            id: id.to_string(),
            session_id: SESSION.to_string(),
            name: name.to_string(),
            joined_at: Utc::now().into(),
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn service_with(db: MockDatabase, events: EventPublisherService) -> SessionService {
        let db = Arc::new(db.into_connection());
        SessionService::new(
            SessionRepository::new(db.clone()),
            RoomRepository::new(db.clone()),
            ParticipantRepository::new(db),
            tokens(),
            events,
        )
    }

    fn service(db: MockDatabase) -> SessionService {
        service_with(db, Arc::new(NoOpEventPublisher))
    }

    fn join_as(name: &str) -> JoinInput {
        JoinInput {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_join_code_shape() {
        for _ in 0..100 {
            let code = generate_join_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_code_lookup_is_case_insensitive() {
        assert_eq!(normalize_code(" abc234 "), "ABC234");
    }

    #[tokio::test]
    async fn test_create_inherits_room_capacity() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_room(TEACHER)]])
                .append_query_results([[create_test_session(true, 0, 25)]]),
        );

        let session = service
            .create(
                TEACHER,
                ROOM,
                CreateSessionInput {
                    title: "Week 1".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(session.max_students, 25);
        assert!(session.is_active);
    }

    #[tokio::test]
    async fn test_create_in_foreign_room_is_forbidden() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_room("ddddddddddddddddddddddd1")]]),
        );

        let result = service
            .create(
                TEACHER,
                ROOM,
                CreateSessionInput {
                    title: "Week 1".to_string(),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_join_closed_session_fails() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_session(false, 3, 30)]]),
        );

        let result = service.join("abc234", join_as("Ada")).await;
        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg.contains("closed")));
    }

    #[tokio::test]
    async fn test_join_full_session_fails() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_session(true, 2, 2)]])
                .append_query_results([Vec::<participant::Model>::new()])
                .append_exec_results([exec(0)])
                .append_query_results([[create_test_session(true, 2, 2)]]),
        );

        let result = service.join("ABC234", join_as("Ada")).await;
        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg.contains("full")));
    }

    #[tokio::test]
    async fn test_rejoin_does_not_take_a_seat() {
        let existing = create_test_participant("eeeeeeeeeeeeeeeeeeeeeee1", "Ada");
        // A full session still admits a returning name; no UPDATE is issued.
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_session(true, 2, 2)]])
                .append_query_results([[existing.clone()]]),
        );

        let outcome = service.join("ABC234", join_as(" Ada ")).await.unwrap();

        assert!(!outcome.newly_joined);
        assert_eq!(outcome.participant, existing);
        assert_eq!(
            tokens().verify_claims(&outcome.token).unwrap(),
            Claims::Participant {
                sub: existing.id,
                sid: SESSION.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_join_takes_seat_and_publishes() {
        let participant = create_test_participant("eeeeeeeeeeeeeeeeeeeeeee1", "Grace");
        let events = Arc::new(RecordingPublisher::default());
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_session(true, 0, 2)]])
                .append_query_results([Vec::<participant::Model>::new()])
                .append_exec_results([exec(1)])
                .append_query_results([[participant.clone()]])
                .append_query_results([[create_test_session(true, 1, 2)]]),
            events.clone(),
        );

        let outcome = service.join("ABC234", join_as("Grace")).await.unwrap();

        assert!(outcome.newly_joined);
        assert_eq!(outcome.session.participant_count, 1);
        assert_eq!(events.kinds().await, ["participantJoined"]);
    }

    #[tokio::test]
    async fn test_join_rejects_blank_name() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.join("ABC234", join_as("   ")).await;
        assert!(matches!(result, Err(AppError::InvalidFields(fields)) if fields.contains("name")));
    }

    #[tokio::test]
    async fn test_close_twice_conflicts() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_session(false, 0, 30)]])
                .append_query_results([[create_test_room(TEACHER)]])
                .append_exec_results([exec(0)]),
        );

        let result = service.close(TEACHER, SESSION).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_close_closes_polls_and_publishes() {
        let events = Arc::new(RecordingPublisher::default());
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_session(true, 4, 30)]])
                .append_query_results([[create_test_room(TEACHER)]])
                .append_exec_results([exec(1), exec(2)])
                .append_query_results([[create_test_session(false, 4, 30)]]),
            events.clone(),
        );

        let session = service.close(TEACHER, SESSION).await.unwrap();

        assert!(!session.is_active);
        assert!(session.closed_at.is_some());
        assert_eq!(events.kinds().await, ["sessionClosed"]);
    }
}
