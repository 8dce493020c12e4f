//! Poll service.

use chrono::Utc;
use classroom_common::{AppError, AppResult, IdGenerator};
use classroom_db::{
    entities::poll,
    repositories::{PollRepository, PollVoteRepository},
};
use sea_orm::Set;
use serde::Deserialize;

use super::{
    access::SessionAccess,
    event_publisher::{EventPublisherService, SessionEvent, publish_or_warn},
    token::Claims,
};
use crate::schema::{self, PollInput};

const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 10;
const MAX_OPTION_LEN: usize = 200;

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    vote_repo: PollVoteRepository,
    access: SessionAccess,
    events: EventPublisherService,
    id_gen: IdGenerator,
}

/// Input for voting.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteInput {
    /// Zero-based option index.
    pub option_index: i32,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(
        poll_repo: PollRepository,
        vote_repo: PollVoteRepository,
        access: SessionAccess,
        events: EventPublisherService,
    ) -> Self {
        Self {
            poll_repo,
            vote_repo,
            access,
            events,
            id_gen: IdGenerator::new(),
        }
    }

    /// Open a poll in a session the teacher owns.
    ///
    /// New polls always start active with zeroed counts, whatever the
    /// document says.
    pub async fn create(&self, teacher_id: &str, input: PollInput) -> AppResult<poll::Model> {
        let document = schema::parse_poll(input)?;

        if document.options.len() < MIN_OPTIONS {
            return Err(AppError::BadRequest(format!(
                "Poll must have at least {MIN_OPTIONS} options"
            )));
        }
        if document.options.len() > MAX_OPTIONS {
            return Err(AppError::BadRequest(format!(
                "Poll cannot have more than {MAX_OPTIONS} options"
            )));
        }
        for option in &document.options {
            if option.text.trim().is_empty() {
                return Err(AppError::BadRequest(
                    "Poll options cannot be empty".to_string(),
                ));
            }
            if option.text.chars().count() > MAX_OPTION_LEN {
                return Err(AppError::BadRequest(format!(
                    "Poll option is too long (max {MAX_OPTION_LEN} chars)"
                )));
            }
        }

        let session = self
            .access
            .owned_session(teacher_id, &document.session_id)
            .await?;
        if !session.is_active {
            return Err(AppError::Conflict("Session is closed".to_string()));
        }

        let model = self.new_poll(&session.id, document)?;

        let poll = self.poll_repo.create(model).await?;
        tracing::info!(poll_id = %poll.id, session_id = %session.id, "Poll opened");

        publish_or_warn(
            &self.events,
            SessionEvent::PollCreated {
                session_id: session.id,
                poll: poll.clone(),
            },
        )
        .await;

        Ok(poll)
    }

    /// Build the row for a new poll. Counts, state and timestamps are
    /// server-owned.
    fn new_poll(
        &self,
        session_id: &str,
        document: schema::PollDocument,
    ) -> AppResult<poll::ActiveModel> {
        let options: Vec<poll::PollOption> = document
            .options
            .into_iter()
            .map(|option| poll::PollOption {
                text: option.text.trim().to_string(),
                votes: 0,
            })
            .collect();
        let options = serde_json::to_value(options)
            .map_err(|e| AppError::Internal(format!("Invalid poll options: {e}")))?;

        Ok(poll::ActiveModel {
            id: Set(self.id_gen.generate()),
            session_id: Set(session_id.to_string()),
            question: Set(document.question),
            options: Set(options),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            closed_at: Set(None),
        })
    }

    /// Polls of a session visible to the caller, newest first.
    pub async fn list(&self, claims: &Claims, session_id: &str) -> AppResult<Vec<poll::Model>> {
        let session = self.access.visible_session(claims, session_id).await?;
        self.poll_repo.find_by_session(&session.id).await
    }

    /// Record a participant's single vote.
    pub async fn vote(
        &self,
        participant_id: &str,
        participant_session_id: &str,
        poll_id: &str,
        input: VoteInput,
    ) -> AppResult<poll::Model> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        let session = self
            .access
            .joined_session(participant_session_id, &poll.session_id)
            .await?;

        if !session.is_active {
            return Err(AppError::Conflict("Session is closed".to_string()));
        }
        if !poll.is_active {
            return Err(AppError::Conflict("Poll is closed".to_string()));
        }

        let option_count = poll
            .decode_options()
            .map_err(|e| AppError::Internal(format!("Invalid poll options: {e}")))?
            .len();
        if usize::try_from(input.option_index).map_or(true, |i| i >= option_count) {
            return Err(AppError::BadRequest("Invalid option".to_string()));
        }

        if self.vote_repo.has_voted(poll_id, participant_id).await? {
            return Err(AppError::Conflict(
                "Already voted on this poll".to_string(),
            ));
        }

        let poll = self
            .poll_repo
            .record_vote(
                self.id_gen.generate(),
                poll_id,
                participant_id,
                input.option_index,
            )
            .await?;

        publish_or_warn(
            &self.events,
            SessionEvent::PollUpdated {
                session_id: poll.session_id.clone(),
                poll: poll.clone(),
            },
        )
        .await;

        Ok(poll)
    }

    /// Close a poll. One-way; closing twice fails with `Conflict`.
    pub async fn close(&self, teacher_id: &str, poll_id: &str) -> AppResult<poll::Model> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        self.access
            .owned_session(teacher_id, &poll.session_id)
            .await?;

        if !self.poll_repo.close(poll_id).await? {
            return Err(AppError::Conflict("Poll is already closed".to_string()));
        }

        let poll = self.poll_repo.get_by_id(poll_id).await?;
        tracing::info!(poll_id, session_id = %poll.session_id, "Poll closed");

        publish_or_warn(
            &self.events,
            SessionEvent::PollClosed {
                session_id: poll.session_id.clone(),
                poll: poll.clone(),
            },
        )
        .await;

        Ok(poll)
    }
}
