//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod account;
pub mod event_publisher;
pub mod poll;
pub mod question;
pub mod room;
pub mod session;
pub mod token;

pub use access::SessionAccess;
pub use account::{AccountService, AuthSession, SigninInput, SignupInput};
pub use event_publisher::{EventPublisher, EventPublisherService, NoOpEventPublisher, SessionEvent};
pub use poll::{PollService, VoteInput};
pub use question::{AskQuestionInput, QuestionService, sort_questions};
pub use room::{RoomPage, RoomService};
pub use session::{JoinInput, JoinOutcome, SessionService, generate_join_code};
pub use token::{Claims, IssueOptions, MIN_SECRET_LEN, TokenService};
