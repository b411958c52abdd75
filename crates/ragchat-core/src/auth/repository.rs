//! UserRepository and TokenRepository trait definitions.

use chrono::{DateTime, Utc};
use ragchat_types::error::RepositoryError;
use ragchat_types::user::{AuthToken, User};
use uuid::Uuid;

/// Repository trait for account persistence.
///
/// Emails are stored normalized (trimmed, lowercase) and are unique.
pub trait UserRepository: Send + Sync {
    /// Insert a new user. `RepositoryError::Conflict` if the email is taken.
    fn create_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn find_by_id(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;
}

/// Repository trait for issued bearer tokens.
pub trait TokenRepository: Send + Sync {
    fn save_token(
        &self,
        token: &AuthToken,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Find a token by digest that has not expired at `now`.
    fn find_valid(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<AuthToken>, RepositoryError>> + Send;

    /// Remove tokens that expired before `now`. Returns how many were removed.
    fn delete_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
