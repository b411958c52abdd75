//! ChatRepository trait definition.
//!
//! Sessions are addressed by `(user_id, session_id)`; turns are append-only.

use ragchat_types::chat::{ChatMessage, ChatSession, MessageRole};
use ragchat_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat transcript persistence.
///
/// Implementations live in ragchat-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Insert a new, empty session.
    ///
    /// Returns `RepositoryError::Conflict` when the user already owns a
    /// session with the same `session_id`.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Look up a session by its owner and client-visible identifier.
    fn find_session(
        &self,
        user_id: &Uuid,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// List a user's sessions, most recently updated first.
    fn list_sessions(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Append a turn to the end of a session.
    ///
    /// Assigns the next sequence number, increments `message_count`, and
    /// bumps `updated_at` in one transaction. Existing turns are never touched.
    fn append_message(
        &self,
        chat_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// Append a question and its answer as two adjacent turns.
    ///
    /// Both turns land in one transaction, so a concurrent append to the same
    /// session can never fall between them and a failure leaves neither.
    fn append_exchange(
        &self,
        chat_id: &Uuid,
        question: &str,
        answer: &str,
    ) -> impl std::future::Future<Output = Result<(ChatMessage, ChatMessage), RepositoryError>> + Send;

    /// All turns of a session in sequence order.
    fn get_messages(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}
