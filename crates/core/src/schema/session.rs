//! Session payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

/// Raw input for opening a session under a room.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Falls back to the room's default capacity.
    #[validate(range(min = 1, max = 1000))]
    pub max_students: Option<i64>,

    pub start_at: Option<DateTime<Utc>>,
}

/// A validated session payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub title: String,
    pub max_students: Option<i32>,
    pub start_at: DateTime<Utc>,
}

/// Validate a session creation payload.
pub fn create_session(input: CreateSessionInput) -> Result<NewSession, ValidationErrors> {
    let input = CreateSessionInput {
        title: input.title.trim().to_string(),
        ..input
    };
    input.validate()?;

    Ok(NewSession {
        title: input.title,
        max_students: input.max_students.and_then(|v| i32::try_from(v).ok()),
        start_at: input.start_at.unwrap_or_else(Utc::now),
    })
}
