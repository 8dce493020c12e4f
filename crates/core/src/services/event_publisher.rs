//! Event publisher service.
//!
//! Services announce every session mutation through [`EventPublisher`].
//! The WebSocket layer in the API crate provides the live implementation.

use async_trait::async_trait;
use classroom_common::AppResult;
use classroom_db::entities::{participant, poll, question, session};
use std::sync::Arc;

/// Something that happened inside a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A student joined.
    ParticipantJoined {
        session_id: String,
        participant: participant::Model,
        participant_count: i32,
    },
    /// A question was asked.
    QuestionAsked {
        session_id: String,
        question: question::Model,
    },
    /// A question was upvoted. Carries the full re-ordered list.
    QuestionUpvoted {
        session_id: String,
        question_id: String,
        questions: Vec<question::Model>,
    },
    /// A poll was opened.
    PollCreated { session_id: String, poll: poll::Model },
    /// A poll's counts changed.
    PollUpdated { session_id: String, poll: poll::Model },
    /// A poll was closed.
    PollClosed { session_id: String, poll: poll::Model },
    /// The session was closed.
    SessionClosed { session: session::Model },
}

impl SessionEvent {
    /// The session this event belongs to.
    #[must_use]
    pub fn session_id(&self) -> &str {
        match self {
            Self::ParticipantJoined { session_id, .. }
            | Self::QuestionAsked { session_id, .. }
            | Self::QuestionUpvoted { session_id, .. }
            | Self::PollCreated { session_id, .. }
            | Self::PollUpdated { session_id, .. }
            | Self::PollClosed { session_id, .. } => session_id,
            Self::SessionClosed { session } => &session.id,
        }
    }

    /// Wire name of the event.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ParticipantJoined { .. } => "participantJoined",
            Self::QuestionAsked { .. } => "questionAsked",
            Self::QuestionUpvoted { .. } => "questionUpvoted",
            Self::PollCreated { .. } => "pollCreated",
            Self::PollUpdated { .. } => "pollUpdated",
            Self::PollClosed { .. } => "pollClosed",
            Self::SessionClosed { .. } => "sessionClosed",
        }
    }
}

/// Trait for publishing session events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event to everyone watching its session.
    async fn publish(&self, event: SessionEvent) -> AppResult<()>;
}

/// A no-op implementation of EventPublisher for testing or when live updates are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: SessionEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed EventPublisher trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

/// Publish an event, logging instead of failing the caller's mutation.
pub(crate) async fn publish_or_warn(publisher: &EventPublisherService, event: SessionEvent) {
    let kind = event.kind();
    let session_id = event.session_id().to_string();

    if let Err(e) = publisher.publish(event).await {
        tracing::warn!(error = %e, kind, session_id = %session_id, "Failed to publish session event");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Publisher that records every event for assertions.
    #[derive(Default)]
    pub struct RecordingPublisher {
        pub events: Mutex<Vec<SessionEvent>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: SessionEvent) -> AppResult<()> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    impl RecordingPublisher {
        pub async fn kinds(&self) -> Vec<&'static str> {
            self.events.lock().await.iter().map(SessionEvent::kind).collect()
        }
    }
}
