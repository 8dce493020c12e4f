//! Database repositories.

mod participant;
mod poll;
mod question;
mod room;
mod session;
mod user;

pub use participant::ParticipantRepository;
pub use poll::{PollRepository, PollVoteRepository};
pub use question::QuestionRepository;
pub use room::RoomRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
