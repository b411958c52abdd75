//! Application error type mapping to HTTP status codes.
//!
//! Every error body has the shape the web client reads:
//! `{"error": "<summary>", "message": "<detail>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use ragchat_core::mail::service::MailServiceError;
use ragchat_types::error::{AuthError, ChatError};
use ragchat_types::mail::MailError;

const DEFAULT_SUMMARY: &str = "Something went wrong!";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    /// Anything the client cannot fix. `summary` is shown as `error`, the
    /// underlying error text as `message`.
    Internal { summary: &'static str, detail: String },
}

impl AppError {
    pub fn internal(detail: impl ToString) -> Self {
        AppError::Internal {
            summary: DEFAULT_SUMMARY,
            detail: detail.to_string(),
        }
    }

    /// Replace the summary of an internal error; other variants pass through.
    pub fn summarized(self, summary: &'static str) -> Self {
        match self {
            AppError::Internal { detail, .. } => AppError::Internal { summary, detail },
            other => other,
        }
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Validation(msg) => AppError::Validation(msg),
            ChatError::NotFound | ChatError::EmptyTranscript => {
                AppError::NotFound("Chat not found".to_string())
            }
            other => AppError::internal(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                AppError::Unauthorized(e.to_string())
            }
            AuthError::EmailTaken(_) => AppError::Conflict(e.to_string()),
            other => AppError::internal(other),
        }
    }
}

impl From<MailServiceError> for AppError {
    fn from(e: MailServiceError) -> Self {
        match e {
            MailServiceError::Validation(msg) => AppError::Validation(msg),
            MailServiceError::Mail(MailError::InvalidAddress(addr)) => {
                AppError::Validation(format!("invalid email address: '{addr}'"))
            }
            MailServiceError::Mail(other) => AppError::internal(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), msg),
            AppError::Internal { summary, detail } => {
                tracing::error!(error = %detail, "{summary}");
                (StatusCode::INTERNAL_SERVER_ERROR, summary.to_string(), detail)
            }
        };

        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_types::error::RepositoryError;
    use ragchat_types::llm::LlmError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_chat_errors_map_to_status() {
        assert_eq!(
            status_of(ChatError::Validation("x".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ChatError::EmptyTranscript.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ChatError::Llm(LlmError::AuthenticationFailed).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_errors_map_to_status() {
        assert_eq!(status_of(AuthError::InvalidToken.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AuthError::EmailTaken("a@b.co".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AuthError::Repository(RepositoryError::Connection).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_summarized_only_touches_internal() {
        match AppError::internal("boom").summarized("Error processing message") {
            AppError::Internal { summary, detail } => {
                assert_eq!(summary, "Error processing message");
                assert_eq!(detail, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            AppError::Validation("x".into()).summarized("ignored"),
            AppError::Validation(_)
        ));
    }
}
