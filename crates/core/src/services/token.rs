//! Signed token issuance and verification.

use chrono::Utc;
use classroom_common::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Identity carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Claims {
    /// A teacher account; `sub` is the user id.
    Teacher { sub: String },
    /// A student admitted to one session; `sub` is the participant id.
    Participant { sub: String, sid: String },
}

/// Per-token issuance options.
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueOptions {
    /// Overrides the service's configured lifetime.
    pub ttl_secs: Option<i64>,
}

#[derive(Serialize, Deserialize)]
struct Envelope<C> {
    #[serde(flatten)]
    claims: C,
    iat: i64,
    exp: i64,
}

/// HS256 token service.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenService {
    /// Create a token service.
    ///
    /// Fails with a configuration error when the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &str, ttl_secs: i64) -> AppResult<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "auth.jwt_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        })
    }

    /// Sign `claims` together with `iat` and `exp`.
    pub fn issue<C: Serialize>(&self, claims: C, options: IssueOptions) -> AppResult<String> {
        let iat = Utc::now().timestamp();
        let envelope = Envelope {
            claims,
            iat,
            exp: iat + options.ttl_secs.unwrap_or(self.ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &envelope, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a token and return its claims.
    ///
    /// Every failure maps to [`AppError::InvalidToken`].
    pub fn verify<C: DeserializeOwned>(&self, token: &str) -> AppResult<C> {
        decode::<Envelope<C>>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token verification failed");
                AppError::InvalidToken
            })
    }

    /// Sign session claims with the default lifetime.
    pub fn issue_claims(&self, claims: &Claims) -> AppResult<String> {
        self.issue(claims, IssueOptions::default())
    }

    /// Verify a token carrying session claims.
    pub fn verify_claims(&self, token: &str) -> AppResult<Claims> {
        self.verify(token)
    }
}
