//! Chat service owning the session rules.
//!
//! ChatService sits between the HTTP handlers / RAG pipeline and the
//! ChatRepository: it generates client-visible session identifiers,
//! implements find-or-create, validates turns before they are appended,
//! and assembles transcripts for history and export.

use chrono::Utc;
use ragchat_types::chat::{ChatMessage, ChatSession, MessageRole, Transcript};
use ragchat_types::error::{ChatError, RepositoryError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::chat::transcript;

const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a session identifier of the form `session_<unix-millis>_<9 base36 chars>`.
pub fn generate_session_id() -> String {
    let mut n = Uuid::new_v4().as_u128();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .map(|_| {
            let c = BASE36[(n % 36) as usize] as char;
            n /= 36;
            c
        })
        .collect();
    format!("session_{}_{suffix}", Utc::now().timestamp_millis())
}

/// Orchestrates chat session lifecycle and message persistence.
///
/// Generic over `ChatRepository` to maintain clean architecture
/// (ragchat-core never depends on ragchat-infra).
pub struct ChatService<C: ChatRepository> {
    repo: C,
}

impl<C: ChatRepository> ChatService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    /// Access the chat repository.
    pub fn repo(&self) -> &C {
        &self.repo
    }

    // --- Session lifecycle ---

    /// Explicitly start a new, empty session with a generated identifier.
    pub async fn create_session(&self, user_id: Uuid) -> Result<ChatSession, ChatError> {
        let session = ChatSession::new(user_id, generate_session_id());
        let created = self.repo.create_session(&session).await?;
        info!(user_id = %user_id, session_id = %created.session_id, "Chat session created");
        Ok(created)
    }

    /// Return the user's session with this identifier, creating it if absent.
    ///
    /// Losing a creation race to a concurrent request is not an error: the
    /// winner's row is read back and returned.
    pub async fn get_or_create_session(
        &self,
        user_id: Uuid,
        session_id: &str,
    ) -> Result<ChatSession, ChatError> {
        let session_id = validate_session_id(session_id)?;

        if let Some(existing) = self.repo.find_session(&user_id, session_id).await? {
            return Ok(existing);
        }

        match self
            .repo
            .create_session(&ChatSession::new(user_id, session_id))
            .await
        {
            Ok(created) => {
                info!(user_id = %user_id, session_id = %session_id, "Chat session created on first message");
                Ok(created)
            }
            Err(RepositoryError::Conflict(_)) => {
                debug!(session_id = %session_id, "Session created concurrently, re-reading");
                self.repo
                    .find_session(&user_id, session_id)
                    .await?
                    .ok_or(ChatError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List a user's sessions, most recently active first.
    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.repo.list_sessions(&user_id, limit, offset).await?)
    }

    // --- Turns ---

    /// Append one turn to a session, creating the session on first use.
    pub async fn append(
        &self,
        user_id: Uuid,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        if role == MessageRole::System {
            return Err(ChatError::Validation(
                "role must be 'user' or 'assistant'".to_string(),
            ));
        }
        if content.trim().is_empty() {
            return Err(ChatError::Validation("content is required".to_string()));
        }

        let session = self.get_or_create_session(user_id, session_id).await?;
        Ok(self.repo.append_message(&session.id, role, content).await?)
    }

    /// Append a completed question/answer pair, user turn first, atomically.
    pub async fn record_exchange(
        &self,
        chat_id: &Uuid,
        question: &str,
        answer: &str,
    ) -> Result<(ChatMessage, ChatMessage), ChatError> {
        let (user, assistant) = self.repo.append_exchange(chat_id, question, answer).await?;
        debug!(chat_id = %chat_id, seq = assistant.seq, "Exchange recorded");
        Ok((user, assistant))
    }

    /// Load the full transcript for a session, or `None` if it does not exist.
    ///
    /// The identifier is normalized the same way as on write.
    pub async fn history(
        &self,
        user_id: Uuid,
        session_id: &str,
    ) -> Result<Option<Transcript>, ChatError> {
        let session_id = validate_session_id(session_id)?;
        let Some(session) = self.repo.find_session(&user_id, session_id).await? else {
            return Ok(None);
        };
        let messages = self.repo.get_messages(&session.id).await?;
        Ok(Some(Transcript { session, messages }))
    }

    /// Render a session as plain text for export.
    ///
    /// Fails with `NotFound` for an unknown session and `EmptyTranscript`
    /// for a session with no turns.
    pub async fn transcript_text(
        &self,
        user_id: Uuid,
        session_id: &str,
    ) -> Result<String, ChatError> {
        let transcript = self
            .history(user_id, session_id)
            .await?
            .ok_or(ChatError::NotFound)?;
        if transcript.is_empty() {
            return Err(ChatError::EmptyTranscript);
        }
        Ok(transcript::render_text(&transcript))
    }
}

fn validate_session_id(session_id: &str) -> Result<&str, ChatError> {
    let trimmed = session_id.trim();
    if trimmed.is_empty() {
        return Err(ChatError::Validation("sessionId is required".to_string()));
    }
    if trimmed.len() > 128 {
        return Err(ChatError::Validation("sessionId is too long".to_string()));
    }
    Ok(trimmed)
}
