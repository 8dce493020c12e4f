//! Error types for the classroom backend.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Token failed verification. The cause is never surfaced.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body could not be decoded.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Decoded input broke field constraints.
    #[error("Validation error: {0}")]
    InvalidFields(FieldErrors),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_)
            | Self::Validation(_)
            | Self::InvalidFields(_)
            | Self::InvalidIdentifier(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) | Self::InvalidFields(_) => "VALIDATION_ERROR",
            Self::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let mut error = json!({
            "code": code,
            "message": self.to_string(),
        });
        if let Self::InvalidFields(fields) = &self {
            error["fields"] = json!(fields);
        }
        let body = Json(json!({ "error": error }));

        (status, body).into_response()
    }
}

// === From implementations ===

/// Offending fields keyed by their wire (camelCase) path, e.g.
/// `defaultMaxStudents` or `options[1].votes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Messages recorded for a field path.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Whether a field path has errors.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    fn collect(&mut self, prefix: &str, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let field: &str = field;
            let path = if prefix.is_empty() {
                wire_name(field)
            } else {
                format!("{prefix}.{}", wire_name(field))
            };

            match kind {
                ValidationErrorsKind::Field(list) => {
                    self.0
                        .entry(path)
                        .or_default()
                        .extend(list.iter().map(describe));
                }
                ValidationErrorsKind::Struct(nested) => self.collect(&path, nested),
                ValidationErrorsKind::List(items) => {
                    for (index, nested) in items {
                        self.collect(&format!("{path}[{index}]"), nested);
                    }
                }
            }
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut fields = Self::default();
        fields.collect("", errors);
        fields
    }
}

/// `default_max_students` -> `defaultMaxStudents`.
fn wire_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let min = error.params.get("min");
    let max = error.params.get("max");
    match (error.code.as_ref(), min, max) {
        ("range", Some(min), Some(max)) => format!("must be between {min} and {max}"),
        ("range", Some(min), None) => format!("must be at least {min}"),
        ("range", None, Some(max)) => format!("must be at most {max}"),
        ("length", Some(min), Some(max)) => {
            format!("must be between {min} and {max} characters")
        }
        ("length", Some(min), None) => format!("must be at least {min} characters"),
        ("length", None, Some(max)) => format!("must be at most {max} characters"),
        (code, _, _) => format!("is invalid ({code})"),
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self::InvalidFields(FieldErrors::from(&err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("name".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidIdentifier("xyz".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Conflict("full".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert!(AppError::Database("down".into()).is_server_error());
    }

    #[test]
    fn test_invalid_token_message_is_generic() {
        assert_eq!(AppError::InvalidToken.to_string(), "Invalid or expired token");
    }

    #[test]
    fn test_validation_errors_use_wire_names() {
        let mut range = ValidationError::new("range");
        range.add_param("min".into(), &1);
        range.add_param("max".into(), &1000);

        let mut errors = ValidationErrors::new();
        errors.add("default_max_students", range);
        errors.add("name", ValidationError::new("length").with_message("too short".into()));

        let AppError::InvalidFields(fields) = AppError::from(errors) else {
            panic!("expected field errors");
        };
        assert_eq!(
            fields.get("defaultMaxStudents"),
            Some(&["must be between 1 and 1000".to_string()][..])
        );
        assert_eq!(fields.get("name"), Some(&["too short".to_string()][..]));
        assert!(!fields.contains("default_max_students"));
        assert_eq!(
            fields.to_string(),
            "defaultMaxStudents: must be between 1 and 1000; name: too short"
        );
    }

    #[test]
    fn test_wire_name() {
        assert_eq!(wire_name("default_max_students"), "defaultMaxStudents");
        assert_eq!(wire_name("session_id"), "sessionId");
        assert_eq!(wire_name("name"), "name");
    }
}
