//! Question service.

use chrono::Utc;
use classroom_common::{AppError, AppResult, IdGenerator};
use classroom_db::{
    entities::question,
    repositories::{ParticipantRepository, QuestionRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::{
    access::SessionAccess,
    event_publisher::{EventPublisherService, SessionEvent, publish_or_warn},
    token::Claims,
};

/// Order questions for display: most upvoted first, newest first among ties.
pub fn sort_questions(questions: &mut [question::Model]) {
    questions.sort_by(|a, b| {
        b.upvotes
            .cmp(&a.upvotes)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Question service for business logic.
#[derive(Clone)]
pub struct QuestionService {
    question_repo: QuestionRepository,
    participant_repo: ParticipantRepository,
    access: SessionAccess,
    events: EventPublisherService,
    id_gen: IdGenerator,
}

/// Input for asking a question.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AskQuestionInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 1000))]
    pub text: String,

    #[serde(default)]
    pub is_anonymous: bool,
}

impl QuestionService {
    /// Create a new question service.
    #[must_use]
    pub const fn new(
        question_repo: QuestionRepository,
        participant_repo: ParticipantRepository,
        access: SessionAccess,
        events: EventPublisherService,
    ) -> Self {
        Self {
            question_repo,
            participant_repo,
            access,
            events,
            id_gen: IdGenerator::new(),
        }
    }

    /// Ask a question in the participant's session.
    pub async fn ask(
        &self,
        participant_id: &str,
        participant_session_id: &str,
        session_id: &str,
        input: AskQuestionInput,
    ) -> AppResult<question::Model> {
        let input = AskQuestionInput {
            text: input.text.trim().to_string(),
            ..input
        };
        input.validate()?;

        let session = self
            .access
            .joined_session(participant_session_id, session_id)
            .await?;
        if !session.is_active {
            return Err(AppError::Conflict("Session is closed".to_string()));
        }

        let participant = self.participant_repo.get_by_id(participant_id).await?;
        let student_name = (!input.is_anonymous).then_some(participant.name);

        let model = question::ActiveModel {
            id: Set(self.id_gen.generate()),
            session_id: Set(session.id.clone()),
            participant_id: Set(Some(participant.id)),
            text: Set(input.text),
            is_anonymous: Set(input.is_anonymous),
            student_name: Set(student_name),
            upvotes: Set(0),
            created_at: Set(Utc::now().into()),
        };

        let question = self.question_repo.create(model).await?;
        tracing::debug!(question_id = %question.id, session_id = %session.id, "Question asked");

        publish_or_warn(
            &self.events,
            SessionEvent::QuestionAsked {
                session_id: session.id,
                question: question.clone(),
            },
        )
        .await;

        Ok(question)
    }

    /// Upvote a question and return the session's questions in display order.
    pub async fn upvote(
        &self,
        participant_session_id: &str,
        question_id: &str,
    ) -> AppResult<Vec<question::Model>> {
        let question = self.question_repo.get_by_id(question_id).await?;
        let session = self
            .access
            .joined_session(participant_session_id, &question.session_id)
            .await?;
        if !session.is_active {
            return Err(AppError::Conflict("Session is closed".to_string()));
        }

        self.question_repo.increment_upvotes(question_id).await?;
        let questions = self.ordered(&session.id).await?;

        publish_or_warn(
            &self.events,
            SessionEvent::QuestionUpvoted {
                session_id: session.id,
                question_id: question_id.to_string(),
                questions: questions.clone(),
            },
        )
        .await;

        Ok(questions)
    }

    /// Questions of a session visible to the caller, in display order.
    pub async fn list(&self, claims: &Claims, session_id: &str) -> AppResult<Vec<question::Model>> {
        let session = self.access.visible_session(claims, session_id).await?;
        self.ordered(&session.id).await
    }

    async fn ordered(&self, session_id: &str) -> AppResult<Vec<question::Model>> {
        let mut questions = self.question_repo.find_by_session(session_id).await?;
        sort_questions(&mut questions);
        Ok(questions)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::event_publisher::{NoOpEventPublisher, testing::RecordingPublisher};
    use chrono::{Duration, TimeZone};
    use classroom_db::{
        entities::{participant, session},
        repositories::{RoomRepository, SessionRepository},
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    const SESSION: &str = "ccccccccccccccccccccccc1";
    const PARTICIPANT: &str = "eeeeeeeeeeeeeeeeeeeeeee1";

    fn create_test_question(id: &str, upvotes: i32, minute: u32) -> question::Model {
        question::Model {
            id: id.to_string(),
            session_id: SESSION.to_string(),
            participant_id: Some(PARTICIPANT.to_string()),
            text: format!("Question {id}"),
            is_anonymous: false,
            student_name: Some("Ada".to_string()),
            upvotes,
            created_at: Utc
                .with_ymd_and_hms(2025, 1, 1, 10, minute, 0)
                .unwrap()
                .into(),
        }
    }

    fn create_test_session(is_active: bool) -> session::Model {
        session::Model {
            id: SESSION.to_string(),
            room_id: "bbbbbbbbbbbbbbbbbbbbbbb1".to_string(),
            title: "Week 1".to_string(),
            code: "ABC234".to_string(),
            is_active,
            max_students: 30,
            participant_count: 1,
            start_at: Utc::now().into(),
            created_at: Utc::now().into(),
            closed_at: None,
        }
    }

    fn create_test_participant() -> participant::Model {
        participant::Model {
            id: PARTICIPANT.to_string(),
            session_id: SESSION.to_string(),
            name: "Ada".to_string(),
            joined_at: Utc::now().into(),
        }
    }

    fn service_with(db: MockDatabase, events: EventPublisherService) -> QuestionService {
        let db = Arc::new(db.into_connection());
        QuestionService::new(
            QuestionRepository::new(db.clone()),
            ParticipantRepository::new(db.clone()),
            SessionAccess::new(SessionRepository::new(db.clone()), RoomRepository::new(db)),
            events,
        )
    }

    #[test]
    fn test_sort_by_upvotes_then_newest() {
        let mut questions = vec![
            create_test_question("q1", 2, 1),
            create_test_question("q2", 5, 2),
            create_test_question("q3", 5, 3),
        ];

        sort_questions(&mut questions);

        let ids: Vec<_> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["q3", "q2", "q1"]);
    }

    #[test]
    fn test_sort_is_stable_under_repeat() {
        let mut questions = vec![
            create_test_question("q1", 0, 5),
            create_test_question("q2", 1, 1),
        ];
        questions[0].created_at = questions[1].created_at + Duration::minutes(1);

        sort_questions(&mut questions);
        let first: Vec<_> = questions.iter().map(|q| q.id.clone()).collect();
        sort_questions(&mut questions);
        let second: Vec<_> = questions.iter().map(|q| q.id.clone()).collect();

        assert_eq!(first, ["q2", "q1"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_anonymous_question_stores_no_name() {
        let mut stored = create_test_question("q1", 0, 1);
        stored.is_anonymous = true;
        stored.student_name = None;

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_session(true)]])
                .append_query_results([[create_test_participant()]])
                .append_query_results([[stored]]),
            Arc::new(NoOpEventPublisher),
        );

        let question = service
            .ask(
                PARTICIPANT,
                SESSION,
                SESSION,
                AskQuestionInput {
                    text: "Why?".to_string(),
                    is_anonymous: true,
                },
            )
            .await
            .unwrap();

        assert!(question.is_anonymous);
        assert_eq!(question.student_name, None);
    }

    #[tokio::test]
    async fn test_ask_in_other_session_is_forbidden() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            Arc::new(NoOpEventPublisher),
        );

        let result = service
            .ask(
                PARTICIPANT,
                "ddddddddddddddddddddddd1",
                SESSION,
                AskQuestionInput {
                    text: "Why?".to_string(),
                    is_anonymous: false,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_upvote_returns_reordered_list() {
        let events = Arc::new(RecordingPublisher::default());
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_question("q1", 2, 1)]])
                .append_query_results([[create_test_session(true)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([vec![
                    create_test_question("q2", 2, 2),
                    create_test_question("q1", 3, 1),
                ]]),
            events.clone(),
        );

        let questions = service.upvote(SESSION, "q1").await.unwrap();

        assert_eq!(questions[0].id, "q1");
        assert_eq!(questions[0].upvotes, 3);
        assert_eq!(events.kinds().await, ["questionUpvoted"]);
    }
}
