//! Account service: signup, login, and token authentication.

use std::sync::Arc;

use chrono::{Duration, Utc};
use ragchat_types::error::{AuthError, RepositoryError};
use ragchat_types::user::{AuthToken, PublicUser, Session, User};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::hasher::{PasswordHasher, TokenMinter};
use crate::auth::repository::{TokenRepository, UserRepository};

const MIN_PASSWORD_LEN: usize = 6;

/// Handles account creation and credential checks.
///
/// Password hashing is CPU-bound, so it runs on the blocking pool.
pub struct AuthService<U: UserRepository, T: TokenRepository> {
    users: U,
    tokens: T,
    hasher: Arc<dyn PasswordHasher>,
    minter: Arc<dyn TokenMinter>,
    token_ttl: Duration,
}

impl<U: UserRepository, T: TokenRepository> AuthService<U, T> {
    pub fn new(
        users: U,
        tokens: T,
        hasher: Arc<dyn PasswordHasher>,
        minter: Arc<dyn TokenMinter>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
            minter,
            token_ttl,
        }
    }

    /// Create an account and sign it in.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() {
            return Err(AuthError::Validation("name is required".to_string()));
        }
        if !ragchat_types::mail::is_plausible_address(&email) {
            return Err(AuthError::Validation("a valid email is required".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken(email));
        }

        let password_hash = self.hash_password(password).await?;
        let user = User {
            id: Uuid::now_v7(),
            name: name.to_string(),
            email: email.clone(),
            password_hash,
            created_at: Utc::now(),
        };

        let user = match self.users.create_user(&user).await {
            Ok(user) => user,
            Err(RepositoryError::Conflict(_)) => return Err(AuthError::EmailTaken(email)),
            Err(e) => return Err(e.into()),
        };
        info!(user_id = %user.id, "Account created");

        self.issue_session(&user).await
    }

    /// Check credentials and issue a new token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            debug!("Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "Login succeeded");
        self.issue_session(&user).await
    }

    /// Resolve a bearer token to its account.
    pub async fn authenticate(&self, token: &str) -> Result<PublicUser, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let digest = self.minter.digest(token);
        let stored = self
            .tokens
            .find_valid(&digest, Utc::now())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let user = self
            .users
            .find_by_id(&stored.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        Ok(user.public())
    }

    /// Look up an account by id.
    pub async fn get_user(&self, id: &Uuid) -> Result<Option<PublicUser>, AuthError> {
        Ok(self.users.find_by_id(id).await?.map(|u| u.public()))
    }

    /// Drop expired tokens. Returns how many were removed.
    pub async fn purge_expired_tokens(&self) -> Result<u64, AuthError> {
        let removed = self.tokens.delete_expired(Utc::now()).await?;
        if removed > 0 {
            debug!(removed, "Expired tokens purged");
        }
        Ok(removed)
    }

    async fn issue_session(&self, user: &User) -> Result<Session, AuthError> {
        let token = self.minter.mint();
        let now = Utc::now();
        let record = AuthToken {
            id: Uuid::now_v7(),
            user_id: user.id,
            token_hash: self.minter.digest(&token),
            created_at: now,
            expires_at: now + self.token_ttl,
        };
        self.tokens.save_token(&record).await?;

        Ok(Session {
            token,
            user: user.public(),
        })
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
