//! Teacher account service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use classroom_common::{AppError, AppResult, IdGenerator};
use classroom_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::token::{Claims, TokenService};

/// Account service for teacher signup and signin.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    tokens: TokenService,
    id_gen: IdGenerator,
}

/// Input for creating a teacher account.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(length(min = 3, max = 64))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 256))]
    pub name: Option<String>,
}

/// Input for signing in.
#[derive(Debug, Deserialize, Validate)]
pub struct SigninInput {
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// A signed-in teacher.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: user::Model,
    pub token: String,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, tokens: TokenService) -> Self {
        Self {
            user_repo,
            tokens,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a teacher and sign them in.
    pub async fn signup(&self, input: SignupInput) -> AppResult<AuthSession> {
        input.validate()?;

        let username = input.username.trim().to_lowercase();
        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username),
            password_hash: Set(password_hash),
            name: Set(input.name),
            created_at: Set(Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, "Teacher account created");

        self.session_for(user)
    }

    /// Check credentials and issue a token.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn signin(&self, input: SigninInput) -> AppResult<AuthSession> {
        input.validate()?;

        let username = input.username.trim().to_lowercase();
        let Some(user) = self.user_repo.find_by_username(&username).await? else {
            return Err(AppError::Unauthorized);
        };

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        self.session_for(user)
    }

    /// Get a teacher by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    fn session_for(&self, user: user::Model) -> AppResult<AuthSession> {
        let token = self.tokens.issue_claims(&Claims::Teacher {
            sub: user.id.clone(),
        })?;
        Ok(AuthSession { user, token })
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn tokens() -> TokenService {
        TokenService::new("account-test-secret-0123456789abcdef", 3600).unwrap()
    }

    fn create_test_user(id: &str, username: &str, password: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: hash_password(password).unwrap(),
            name: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> AccountService {
        AccountService::new(UserRepository::new(Arc::new(db.into_connection())), tokens())
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("test_password_123", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "not-a-hash").is_err());
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .signup(SignupInput {
                username: "ada".to_string(),
                password: "short".to_string(),
                name: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::InvalidFields(fields)) if fields.contains("password")));
    }

    #[tokio::test]
    async fn test_signup_rejects_taken_username() {
        let existing = create_test_user("aaaaaaaaaaaaaaaaaaaaaaa1", "ada", "correct horse");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]),
        );

        let result = service
            .signup(SignupInput {
                username: "Ada".to_string(),
                password: "long enough".to_string(),
                name: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_signin_issues_teacher_token() {
        let user = create_test_user("aaaaaaaaaaaaaaaaaaaaaaa1", "ada", "correct horse");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user.clone()]]),
        );

        let session = service
            .signin(SigninInput {
                username: "ada".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            tokens().verify_claims(&session.token).unwrap(),
            Claims::Teacher { sub: user.id }
        );
    }

    #[tokio::test]
    async fn test_signin_failures_are_indistinguishable() {
        let user = create_test_user("aaaaaaaaaaaaaaaaaaaaaaa1", "ada", "correct horse");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let wrong_password = service
            .signin(SigninInput {
                username: "ada".to_string(),
                password: "battery staple".to_string(),
            })
            .await;
        let unknown_user = service
            .signin(SigninInput {
                username: "grace".to_string(),
                password: "battery staple".to_string(),
            })
            .await;

        assert!(matches!(wrong_password, Err(AppError::Unauthorized)));
        assert!(matches!(unknown_user, Err(AppError::Unauthorized)));
    }
}
