//! In-memory port implementations and mocks for tests in this crate and downstream crates.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use ragchat_types::chat::{ChatMessage, ChatSession, MessageRole};
use ragchat_types::error::{AuthError, RepositoryError};
use ragchat_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason,
    StreamEvent, Usage,
};
use ragchat_types::mail::{EmailMessage, MailError};
use ragchat_types::retrieval::{EmbeddedChunk, RetrievalError, RetrievedChunk};
use ragchat_types::user::{AuthToken, User};
use uuid::Uuid;

use crate::auth::hasher::{PasswordHasher, TokenMinter};
use crate::auth::repository::{TokenRepository, UserRepository};
use crate::chat::repository::ChatRepository;
use crate::llm::provider::{LlmProvider, LlmStream};
use crate::mail::mailer::Mailer;
use crate::retrieval::embedder::{EmbedKind, Embedder};
use crate::retrieval::index::VectorIndex;

// --- Chat ---

#[derive(Default)]
pub struct InMemoryChatRepository {
    sessions: Mutex<Vec<ChatSession>>,
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryChatRepository {
    /// Append turns while holding the session lock, so they stay contiguous.
    fn append_turns(
        &self,
        chat_id: &Uuid,
        turns: &[(MessageRole, &str)],
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| &s.id == chat_id)
            .ok_or(RepositoryError::NotFound)?;
        let mut messages = self.messages.lock().unwrap();
        let now = Utc::now();
        let mut appended = Vec::with_capacity(turns.len());
        for (role, content) in turns {
            session.message_count += 1;
            let message = ChatMessage {
                id: Uuid::now_v7(),
                chat_id: *chat_id,
                seq: session.message_count,
                role: *role,
                content: content.to_string(),
                created_at: now,
            };
            messages.push(message.clone());
            appended.push(message);
        }
        session.updated_at = now;
        Ok(appended)
    }
}

impl ChatRepository for InMemoryChatRepository {
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl Future<Output = Result<ChatSession, RepositoryError>> + Send {
        let result = {
            let mut sessions = self.sessions.lock().unwrap();
            if sessions
                .iter()
                .any(|s| s.user_id == session.user_id && s.session_id == session.session_id)
            {
                Err(RepositoryError::Conflict(session.session_id.clone()))
            } else {
                sessions.push(session.clone());
                Ok(session.clone())
            }
        };
        async move { result }
    }

    fn find_session(
        &self,
        user_id: &Uuid,
        session_id: &str,
    ) -> impl Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send {
        let found = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| &s.user_id == user_id && s.session_id == session_id)
            .cloned();
        async move { Ok(found) }
    }

    fn list_sessions(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send {
        let mut found: Vec<ChatSession> = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let found: Vec<ChatSession> = found
            .into_iter()
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.unwrap_or(i64::MAX) as usize)
            .collect();
        async move { Ok(found) }
    }

    fn append_message(
        &self,
        chat_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> impl Future<Output = Result<ChatMessage, RepositoryError>> + Send {
        let result = self
            .append_turns(chat_id, &[(role, content)])
            .and_then(|mut turns| turns.pop().ok_or(RepositoryError::NotFound));
        async move { result }
    }

    fn append_exchange(
        &self,
        chat_id: &Uuid,
        question: &str,
        answer: &str,
    ) -> impl Future<Output = Result<(ChatMessage, ChatMessage), RepositoryError>> + Send {
        let result = self
            .append_turns(
                chat_id,
                &[(MessageRole::User, question), (MessageRole::Assistant, answer)],
            )
            .and_then(|turns| match <[ChatMessage; 2]>::try_from(turns) {
                Ok([user, assistant]) => Ok((user, assistant)),
                Err(_) => Err(RepositoryError::NotFound),
            });
        async move { result }
    }

    fn get_messages(
        &self,
        chat_id: &Uuid,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send {
        let mut found: Vec<ChatMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.chat_id == chat_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.seq);
        async move { Ok(found) }
    }
}

// --- LLM ---

/// Scripted LLM: each call pops the next reply; an exhausted script
/// answers "ok". Clones share the script and the request log.
#[derive(Clone)]
pub struct MockLlm {
    script: Arc<Mutex<VecDeque<Result<String, ()>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    capabilities: ProviderCapabilities,
    interrupt_stream: bool,
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::scripted(Vec::new())
    }
}

impl MockLlm {
    pub fn scripted(script: Vec<Result<String, ()>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
            capabilities: ProviderCapabilities {
                streaming: true,
                max_context_tokens: 128_000,
                max_output_tokens: 8_192,
            },
            interrupt_stream: false,
        }
    }

    /// Streams the first word of `reply`, then fails with a stream error.
    pub fn interrupted(reply: &str) -> Self {
        Self {
            interrupt_stream: true,
            ..Self::replying([reply])
        }
    }

    pub fn replying<'a>(replies: impl IntoIterator<Item = &'a str>) -> Self {
        Self::scripted(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Every call fails.
    pub fn failing() -> Self {
        Self::scripted((0..16).map(|_| Err(())).collect())
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(())) => Err(LlmError::Provider {
                message: "mock failure".to_string(),
            }),
            None => Ok("ok".to_string()),
        }
    }
}

impl LlmProvider for MockLlm {
    fn name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        let result = self.next(request).map(|content| CompletionResponse {
            id: "mock-response".to_string(),
            content,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
            },
        });
        async move { result }
    }

    fn stream(&self, request: CompletionRequest) -> LlmStream {
        let result = self.next(&request);
        let interrupt = self.interrupt_stream;
        Box::pin(async_stream::stream! {
            match result {
                Ok(reply) => {
                    yield Ok(StreamEvent::Connected);
                    for piece in reply.split_inclusive(' ') {
                        yield Ok(StreamEvent::TextDelta { text: piece.to_string() });
                        if interrupt {
                            yield Err(LlmError::Stream("connection reset".to_string()));
                            return;
                        }
                    }
                    yield Ok(StreamEvent::Usage(Usage { input_tokens: 10, output_tokens: 20 }));
                    yield Ok(StreamEvent::MessageDelta { stop_reason: StopReason::EndTurn });
                    yield Ok(StreamEvent::Done);
                }
                Err(e) => yield Err(e),
            }
        })
    }
}

// --- Retrieval ---

/// Deterministic embedder: vector[i] = text length + i.
#[derive(Clone)]
pub struct MockEmbedder {
    dimension: usize,
    fail: bool,
    embedded: Arc<Mutex<Vec<String>>>,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: false,
            embedded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(4)
        }
    }

    pub fn embedded(&self) -> Vec<String> {
        self.embedded.lock().unwrap().clone()
    }
}

impl Embedder for MockEmbedder {
    fn embed(
        &self,
        texts: &[String],
        _kind: EmbedKind,
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send {
        let result = if self.fail {
            Err(RetrievalError::Embedding("mock failure".to_string()))
        } else {
            self.embedded.lock().unwrap().extend(texts.iter().cloned());
            Ok(texts
                .iter()
                .map(|t| (0..self.dimension).map(|i| (t.len() + i) as f32).collect())
                .collect())
        };
        async move { result }
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Index returning preset chunks; records each query's `top_k` and keeps
/// the ids of upserted chunks until they are deleted.
#[derive(Clone, Default)]
pub struct MockIndex {
    chunks: Vec<RetrievedChunk>,
    fail: bool,
    queries: Arc<Mutex<Vec<usize>>>,
    upserted: Arc<Mutex<Vec<String>>>,
}

impl MockIndex {
    pub fn with_chunks(chunks: Vec<RetrievedChunk>) -> Self {
        Self {
            chunks,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<usize> {
        self.queries.lock().unwrap().clone()
    }
}

impl VectorIndex for MockIndex {
    fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
    ) -> impl Future<Output = Result<Vec<RetrievedChunk>, RetrievalError>> + Send {
        self.queries.lock().unwrap().push(top_k);
        let result = if self.fail {
            Err(RetrievalError::Index("mock failure".to_string()))
        } else {
            Ok(self.chunks.iter().take(top_k).cloned().collect())
        };
        async move { result }
    }

    fn upsert(
        &self,
        chunks: &[EmbeddedChunk],
    ) -> impl Future<Output = Result<usize, RetrievalError>> + Send {
        let mut upserted = self.upserted.lock().unwrap();
        upserted.extend(chunks.iter().map(|c| c.record.id.clone()));
        // Overwrites keep one entry per id.
        upserted.sort();
        upserted.dedup();
        drop(upserted);
        let n = chunks.len();
        async move { Ok(n) }
    }

    fn list_ids(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<String>, RetrievalError>> + Send {
        let ids: Vec<String> = self
            .upserted
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect();
        async move { Ok(ids) }
    }

    fn delete(&self, ids: &[String]) -> impl Future<Output = Result<(), RetrievalError>> + Send {
        self.upserted.lock().unwrap().retain(|id| !ids.contains(id));
        async { Ok(()) }
    }
}

// --- Mail ---

#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    fn name(&self) -> &str {
        "recording"
    }

    fn send(&self, message: &EmailMessage) -> impl Future<Output = Result<(), MailError>> + Send {
        let result = if self.fail {
            Err(MailError::Transport("mock failure".to_string()))
        } else {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        };
        async move { result }
    }
}

// --- Accounts ---

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl UserRepository for InMemoryUserRepository {
    fn create_user(&self, user: &User) -> impl Future<Output = Result<User, RepositoryError>> + Send {
        let result = {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == user.email) {
                Err(RepositoryError::Conflict(user.email.clone()))
            } else {
                users.push(user.clone());
                Ok(user.clone())
            }
        };
        async move { result }
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send {
        let found = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned();
        async move { Ok(found) }
    }

    fn find_by_id(&self, id: &Uuid) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send {
        let found = self.users.lock().unwrap().iter().find(|u| &u.id == id).cloned();
        async move { Ok(found) }
    }
}

#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: Mutex<Vec<AuthToken>>,
}

impl TokenRepository for InMemoryTokenRepository {
    fn save_token(&self, token: &AuthToken) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        self.tokens.lock().unwrap().push(token.clone());
        async { Ok(()) }
    }

    fn find_valid(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<AuthToken>, RepositoryError>> + Send {
        let found = self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token_hash == token_hash && t.expires_at > now)
            .cloned();
        async move { Ok(found) }
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64, RepositoryError>> + Send {
        let removed = {
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| t.expires_at > now);
            (before - tokens.len()) as u64
        };
        async move { Ok(removed) }
    }
}

/// Reversible "hashing" and sequential tokens, for fast deterministic tests.
pub struct PlainHasher;

static TOKEN_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

impl PasswordHasher for PlainHasher {
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain${password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        hash.strip_prefix("plain$") == Some(password)
    }
}

impl TokenMinter for PlainHasher {
    fn mint(&self) -> String {
        let n = TOKEN_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!("rc_test{n}")
    }

    fn digest(&self, token: &str) -> String {
        format!("digest:{token}")
    }
}
