//! Chat transcript types.
//!
//! A transcript is a session identifier owned by one user plus an ordered,
//! append-only list of user/assistant turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// A chat session owned by a single user.
///
/// `session_id` is the identifier the client sees and sends back. It is
/// unique per user, not globally; `id` is the internal primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u32,
}

impl ChatSession {
    /// A fresh, empty session for `user_id`.
    pub fn new(user_id: Uuid, session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            session_id: session_id.into(),
            created_at: now,
            updated_at: now,
            message_count: 0,
        }
    }
}

/// A single turn within a chat session.
///
/// `seq` starts at 1 and is assigned by the store when the turn is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub seq: u32,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A session together with its turns in conversation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
