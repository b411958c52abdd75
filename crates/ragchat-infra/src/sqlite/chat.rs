//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `ragchat-core` using sqlx with split
//! read/write pools. Sessions are looked up by `(user_id, session_id)`;
//! turns are appended inside a writer transaction that also bumps the
//! session's counters, so `seq` and `message_count` never drift apart. A
//! question/answer pair shares one transaction and stays adjacent.

use chrono::Utc;
use ragchat_core::chat::repository::ChatRepository;
use ragchat_types::chat::{ChatMessage, ChatSession, MessageRole};
use ragchat_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Append `turns` contiguously in one writer transaction.
    ///
    /// `message_count` is bumped by the number of turns first; the turns take
    /// the sequence numbers just below the new count, in order.
    async fn append_turns(
        &self,
        chat_id: &Uuid,
        turns: &[(MessageRole, &str)],
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = sqlx::query(
            r#"UPDATE chat_sessions
               SET message_count = message_count + ?, updated_at = ?
               WHERE id = ?
               RETURNING message_count"#,
        )
        .bind(turns.len() as i64)
        .bind(format_datetime(&now))
        .bind(chat_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };
        let count: i64 = row
            .try_get("message_count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let first_seq = count - turns.len() as i64 + 1;

        let mut messages = Vec::with_capacity(turns.len());
        for (offset, (role, content)) in turns.iter().enumerate() {
            let message = ChatMessage {
                id: Uuid::now_v7(),
                chat_id: *chat_id,
                seq: (first_seq + offset as i64) as u32,
                role: *role,
                content: content.to_string(),
                created_at: now,
            };

            sqlx::query(
                r#"INSERT INTO chat_messages (id, chat_id, seq, role, content, created_at)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
            )
            .bind(message.id.to_string())
            .bind(chat_id.to_string())
            .bind(message.seq as i64)
            .bind(role.to_string())
            .bind(&message.content)
            .bind(format_datetime(&now))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

            messages.push(message);
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(messages)
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    id: String,
    user_id: String,
    session_id: String,
    created_at: String,
    updated_at: String,
    message_count: i64,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            session_id: row.try_get("session_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            message_count: row.try_get("message_count")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        Ok(ChatSession {
            id: parse_uuid(&self.id, "session id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            session_id: self.session_id,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            message_count: self.message_count as u32,
        })
    }
}

struct ChatMessageRow {
    id: String,
    chat_id: String,
    seq: i64,
    role: String,
    content: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            seq: row.try_get("seq")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id: parse_uuid(&self.id, "message id")?,
            chat_id: parse_uuid(&self.chat_id, "chat_id")?,
            seq: self.seq as u32,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        let result = sqlx::query(
            r#"INSERT INTO chat_sessions (id, user_id, session_id, created_at, updated_at, message_count)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(&session.session_id)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .bind(session.message_count as i64)
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(session.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("session '{}' already exists", session.session_id)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn find_session(
        &self,
        user_id: &Uuid,
        session_id: &str,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE user_id = ? AND session_id = ?")
            .bind(user_id.to_string())
            .bind(session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_sessions(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut sql = String::from(
            "SELECT * FROM chat_sessions WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
        );

        // SQLite requires a LIMIT before OFFSET; -1 means unbounded.
        match (limit, offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = ChatSessionRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn append_message(
        &self,
        chat_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut appended = self.append_turns(chat_id, &[(role, content)]).await?;
        appended.pop().ok_or(RepositoryError::NotFound)
    }

    async fn append_exchange(
        &self,
        chat_id: &Uuid,
        question: &str,
        answer: &str,
    ) -> Result<(ChatMessage, ChatMessage), RepositoryError> {
        let mut appended = self
            .append_turns(
                chat_id,
                &[(MessageRole::User, question), (MessageRole::Assistant, answer)],
            )
            .await?
            .into_iter();
        match (appended.next(), appended.next()) {
            (Some(user), Some(assistant)) => Ok((user, assistant)),
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn get_messages(&self, chat_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM chat_messages WHERE chat_id = ? ORDER BY seq ASC")
            .bind(chat_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }
}
