//! Follow-up question rewriting.
//!
//! `rewrite_query` turns a follow-up ("how do I traverse it?") into a
//! standalone question using the conversation so far, so retrieval does
//! not depend on pronouns the vector index cannot resolve. Any failure
//! degrades to the original question.

use ragchat_types::llm::{CompletionRequest, Message};
use tracing::{Instrument, debug, info_span, warn};

use crate::llm::provider::LlmProvider;

/// System prompt for the rewrite call.
const REWRITE_SYSTEM_PROMPT: &str = r#"You rewrite follow-up questions. Using the chat history, rephrase the user's latest question into a complete, standalone question that can be understood without the history.

Rules:
1. Output only the rewritten question, nothing else
2. Make it self-contained and clear
3. Keep the intent and every specific detail
4. If it is already standalone, return it unchanged

Example:
History: "What is a binary tree?"
Follow-up: "How do I traverse it?"
Output: "How do I traverse a binary tree?""#;

/// Sampling settings for the rewrite call.
#[derive(Debug, Clone)]
pub struct RewriteSettings {
    pub enabled: bool,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Rewrite `question` into a standalone question given prior turns.
///
/// Returns the original question when rewriting is disabled, when there is
/// no history to resolve against, when the provider fails, or when it
/// returns nothing usable.
pub async fn rewrite_query<P: LlmProvider>(
    provider: &P,
    settings: &RewriteSettings,
    question: &str,
    history: &[Message],
) -> String {
    if !settings.enabled || history.is_empty() {
        return question.to_string();
    }

    let mut messages = history.to_vec();
    messages.push(Message::user(question));

    let request = CompletionRequest {
        model: settings.model.clone(),
        messages,
        system: Some(REWRITE_SYSTEM_PROMPT.to_string()),
        max_tokens: settings.max_tokens,
        temperature: Some(settings.temperature),
        top_p: None,
        stream: false,
        stop_sequences: None,
    };

    let span = info_span!(
        "gen_ai.rewrite_query",
        gen_ai.system = provider.name(),
        gen_ai.request.model = %request.model,
        gen_ai.request.max_tokens = request.max_tokens,
        gen_ai.request.temperature = ?request.temperature,
    );

    match provider.complete(&request).instrument(span).await {
        Ok(response) => {
            let rewritten = clean_rewrite(&response.content);
            if rewritten.is_empty() {
                warn!("Query rewrite returned empty text, using original question");
                question.to_string()
            } else {
                debug!(original = %question, rewritten = %rewritten, "Query rewritten");
                rewritten
            }
        }
        Err(e) => {
            warn!(error = %e, "Query rewrite failed, using original question");
            question.to_string()
        }
    }
}

/// Trim whitespace and surrounding quotes from model output.
fn clean_rewrite(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
        .to_string()
}
