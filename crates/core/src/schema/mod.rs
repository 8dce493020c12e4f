//! Field contracts for client payloads.
//!
//! Every function here is pure and synchronous: it takes the raw client
//! input and either returns a normalized value or the field-level
//! [`validator::ValidationErrors`] describing what was wrong.

#![allow(missing_docs)]

mod poll;
mod query;
mod room;
mod session;

pub use poll::{PollDocument, PollInput, PollOptionInput, parse_poll};
pub use query::{
    ListQuery, ListQueryParams, SessionListQuery, SessionListQueryParams, parse_list_query,
    parse_session_list_query,
};
pub use room::{
    CreateRoomInput, DEFAULT_MAX_STUDENTS, NewRoom, RoomPatch, UpdateRoomInput, create_room,
    parse_room_id, update_room,
};
pub use session::{CreateSessionInput, NewSession, create_session};

use validator::ValidationError;

/// Build a [`ValidationError`] carrying a human-readable message.
pub(crate) fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}
