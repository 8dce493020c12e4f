//! Core business logic for the classroom backend.
//!
//! - [`schema`]: pure validation of client payloads
//! - [`services`]: rooms, sessions, questions, polls, accounts and tokens

pub mod schema;
pub mod services;

pub use services::*;
