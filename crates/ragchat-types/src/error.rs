use thiserror::Error;

use crate::llm::LlmError;
use crate::retrieval::RetrievalError;

/// Errors from repository operations (used by trait definitions in ragchat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to account signup, login, and token checks.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with email '{0}' already exists")]
    EmailTaken(String),

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    Validation(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors raised while handling a chat request.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("chat not found")]
    NotFound,

    #[error("chat has no messages")]
    EmptyTranscript,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}
