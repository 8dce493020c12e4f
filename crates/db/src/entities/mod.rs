//! Database entities.

pub mod participant;
pub mod poll;
pub mod poll_vote;
pub mod question;
pub mod room;
pub mod session;
pub mod user;

pub use participant::Entity as Participant;
pub use poll::Entity as Poll;
pub use poll_vote::Entity as PollVote;
pub use question::Entity as Question;
pub use room::Entity as Room;
pub use session::Entity as Session;
pub use user::Entity as User;
