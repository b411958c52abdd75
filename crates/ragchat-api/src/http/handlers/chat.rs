//! Chat endpoints: answering questions, history, sessions, and export.
//!
//! POST /api/chat/message/stream streams the answer as Server-Sent Events:
//! - `session`: `{ "sessionId": "..." }` before generation starts
//! - `text_delta`: incremental text, `{ "text": "..." }`
//! - `usage`: token usage, `{ "input_tokens": N, "output_tokens": N }`
//! - `done`: stream complete, `{}`
//! - `error`: generation failed, `{ "message": "..." }`
//!
//! The exchange is persisted only when generation finishes without error.

use std::convert::Infallible;
use std::str::FromStr;
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use ragchat_core::rag::turn::answer_turn;
use ragchat_types::chat::{ChatMessage, ChatSession, MessageRole};
use ragchat_types::llm::StreamEvent;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::extractors::query::SessionListQuery;
use crate::state::AppState;

const MISSING_FIELDS: &str = "Message and sessionId are required";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub email: String,
}

/// A transcript turn as the web client sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub role: MessageRole,
    pub content: String,
    pub seq: u32,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for MessageDto {
    fn from(m: ChatMessage) -> Self {
        Self {
            role: m.role,
            content: m.content,
            seq: m.seq,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub message_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChatSession> for SessionSummary {
    fn from(s: ChatSession) -> Self {
        Self {
            session_id: s.session_id,
            message_count: s.message_count,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

fn messages_json(messages: Vec<ChatMessage>) -> Vec<MessageDto> {
    messages.into_iter().map(MessageDto::from).collect()
}

/// POST /api/chat/message: Answer a question and record the exchange.
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if body.message.trim().is_empty() || body.session_id.trim().is_empty() {
        return Err(AppError::Validation(MISSING_FIELDS.to_string()));
    }

    let outcome = answer_turn(
        &state.chat_service,
        &state.rag,
        user.id,
        &body.session_id,
        &body.message,
    )
    .await
    .map_err(|e| AppError::from(e).summarized("Error processing message"))?;

    Ok(Json(MessageResponse {
        message: outcome.answer.answer,
        session_id: outcome.session.session_id,
    }))
}

/// POST /api/chat/message/stream: SSE variant of `send_message`.
pub async fn stream_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<MessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let question = body.message.trim().to_string();
    if question.is_empty() || body.session_id.trim().is_empty() {
        return Err(AppError::Validation(MISSING_FIELDS.to_string()));
    }

    let session = state
        .chat_service
        .get_or_create_session(user.id, &body.session_id)
        .await?;
    let history = state
        .chat_service
        .history(user.id, &session.session_id)
        .await?
        .map(|t| t.messages)
        .unwrap_or_default();
    let prepared = state
        .rag
        .prepare(&question, &history)
        .await
        .map_err(|e| AppError::from(e).summarized("Error processing message"))?;

    let rag = state.rag.clone();
    let chat_service = state.chat_service.clone();

    let sse_stream = async_stream::stream! {
        let session_json = json!({ "sessionId": session.session_id });
        yield Ok::<_, Infallible>(Event::default().event("session").data(session_json.to_string()));

        let mut llm_stream = rag.stream(&prepared);
        let mut answer = String::new();
        let mut had_error = false;

        while let Some(event_result) = llm_stream.next().await {
            match event_result {
                Ok(StreamEvent::TextDelta { text }) => {
                    let data = json!({ "text": text });
                    yield Ok(Event::default().event("text_delta").data(data.to_string()));
                    answer.push_str(&text);
                }
                Ok(StreamEvent::Usage(usage)) => {
                    let data = serde_json::to_string(&usage).unwrap_or_default();
                    yield Ok(Event::default().event("usage").data(data));
                }
                Ok(StreamEvent::Done) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, session_id = %session.session_id, "Streaming generation failed");
                    let data = json!({ "message": e.to_string() });
                    yield Ok(Event::default().event("error").data(data.to_string()));
                    had_error = true;
                    break;
                }
            }
        }

        if !had_error && !answer.is_empty() {
            if let Err(e) = chat_service.record_exchange(&session.id, &question, &answer).await {
                tracing::error!(error = %e, session_id = %session.session_id, "Failed to persist streamed exchange");
                let data = json!({ "message": "Failed to save conversation" });
                yield Ok(Event::default().event("error").data(data.to_string()));
            }
        }

        yield Ok(Event::default().event("done").data("{}"));
    };

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

/// GET /api/chat/history/{sessionId}
pub async fn get_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let transcript = state
        .chat_service
        .history(user.id, &session_id)
        .await
        .map_err(|e| AppError::from(e).summarized("Error fetching chat history"))?;

    Ok(Json(match transcript {
        Some(t) => json!({
            "sessionId": t.session.session_id,
            "messages": messages_json(t.messages),
        }),
        None => json!({ "messages": [] }),
    }))
}

/// POST /api/chat/session: Start a new, empty session.
pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let session = state
        .chat_service
        .create_session(user.id)
        .await
        .map_err(|e| AppError::from(e).summarized("Error creating session"))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "sessionId": session.session_id })),
    ))
}

/// GET /api/chat/sessions: The account's sessions, most recent first.
pub async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<Value>, AppError> {
    let sessions = state
        .chat_service
        .list_sessions(user.id, query.limit, query.offset)
        .await
        .map_err(|e| AppError::from(e).summarized("Error listing sessions"))?;
    let sessions: Vec<SessionSummary> = sessions.into_iter().map(SessionSummary::from).collect();
    Ok(Json(json!({ "sessions": sessions })))
}

/// GET /api/chat/session/{sessionId}: The bare message array, empty when unknown.
pub async fn get_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<MessageDto>>, AppError> {
    let messages = state
        .chat_service
        .history(user.id, &session_id)
        .await
        .map_err(|e| AppError::from(e).summarized("Error fetching chat"))?
        .map(|t| messages_json(t.messages))
        .unwrap_or_default();
    Ok(Json(messages))
}

/// POST /api/chat/save: Append a single turn, creating the session if needed.
pub async fn save_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<SaveRequest>,
) -> Result<Json<Value>, AppError> {
    let role = MessageRole::from_str(&body.role).map_err(AppError::Validation)?;
    state
        .chat_service
        .append(user.id, &body.session_id, role, &body.content)
        .await
        .map_err(|e| AppError::from(e).summarized("Error saving message"))?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/chat/download: Email the transcript as `chat.txt`.
pub async fn download_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<DownloadRequest>,
) -> Result<Json<Value>, AppError> {
    let session_id = body.session_id.trim();
    let email = body.email.trim();
    if session_id.is_empty() || email.is_empty() {
        return Err(AppError::Validation("Missing sessionId or email".to_string()));
    }

    let text = state
        .chat_service
        .transcript_text(user.id, session_id)
        .await
        .map_err(|e| AppError::from(e).summarized("Failed to send chat"))?;
    state
        .mail_service
        .send_transcript(email, session_id, text)
        .await
        .map_err(|e| AppError::from(e).summarized("Failed to send chat"))?;

    Ok(Json(json!({ "success": true })))
}
