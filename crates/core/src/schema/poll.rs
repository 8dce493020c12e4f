//! Poll payloads.

use chrono::{DateTime, Utc};
use classroom_db::entities::poll::PollOption;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use super::field_error;

static SESSION_ID: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?i)^[a-f\d]{24}$").unwrap()
});

fn validate_session_id(value: &str) -> Result<(), ValidationError> {
    if SESSION_ID.is_match(value) {
        Ok(())
    } else {
        Err(field_error("session_id", "must be a 24-character hex identifier"))
    }
}

const fn default_true() -> bool {
    true
}

/// Raw poll document.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PollInput {
    #[serde(default)]
    #[validate(custom(function = "validate_session_id"))]
    pub session_id: String,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub question: String,

    #[serde(default)]
    #[validate(nested)]
    pub options: Vec<PollOptionInput>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

/// Raw poll option.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PollOptionInput {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub votes: i64,
}

/// A validated poll document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDocument {
    /// Lowercased session identifier.
    pub session_id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Validate a poll document.
pub fn parse_poll(input: PollInput) -> Result<PollDocument, ValidationErrors> {
    let mut errors = match input.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };

    if input.options.is_empty() {
        errors.add("options", field_error("length", "must contain at least one option"));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(PollDocument {
        session_id: input.session_id.to_lowercase(),
        question: input.question,
        options: input
            .options
            .into_iter()
            .map(|option| PollOption {
                text: option.text,
                votes: option.votes,
            })
            .collect(),
        is_active: input.is_active,
        created_at: input.created_at,
        closed_at: input.closed_at,
    })
}
