//! Document identifier generation and parsing.
//!
//! Identifiers are 24 hexadecimal characters: a 4-byte big-endian Unix
//! timestamp followed by 8 random bytes. They sort roughly by creation time.

use chrono::Utc;
use once_cell::sync::Lazy;
use rand::RngCore;
use regex::Regex;

use crate::{AppError, AppResult};

/// Length of an identifier in hex characters.
pub const ID_LEN: usize = 24;

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[0-9a-fA-F]{24}$").unwrap()
});

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new identifier (lowercase hex).
    #[must_use]
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; 12];
        let secs = Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        rand::thread_rng().fill_bytes(&mut bytes[4..]);
        hex::encode(bytes)
    }
}

/// Returns whether `raw` is a well-formed identifier.
#[must_use]
pub fn is_valid_id(raw: &str) -> bool {
    ID_PATTERN.is_match(raw)
}

/// Parse an identifier from untrusted input.
///
/// Accepts either case and normalizes to lowercase, which is how identifiers
/// are stored.
pub fn parse_id(raw: &str) -> AppResult<String> {
    if is_valid_id(raw) {
        Ok(raw.to_ascii_lowercase())
    } else {
        Err(AppError::InvalidIdentifier(raw.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_well_formed() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), ID_LEN);
        assert!(is_valid_id(&id1));
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_ascii_lowercase());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(
            parse_id("507f1f77bcf86cd799439011").unwrap(),
            "507f1f77bcf86cd799439011"
        );
        assert_eq!(
            parse_id("507F1F77BCF86CD799439011").unwrap(),
            "507f1f77bcf86cd799439011"
        );

        assert!(matches!(
            parse_id("xyz"),
            Err(AppError::InvalidIdentifier(_))
        ));
        assert!(parse_id("507f1f77bcf86cd79943901").is_err()); // 23 chars
        assert!(parse_id("507f1f77bcf86cd7994390111").is_err()); // 25 chars
        assert!(parse_id("507f1f77bcf86cd79943901g").is_err());
        assert!(parse_id("").is_err());
    }
}
