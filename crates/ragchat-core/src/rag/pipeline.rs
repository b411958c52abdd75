//! The retrieval-augmented answer pipeline.
//!
//! rewrite -> embed -> vector search -> prompt assembly -> generation.
//! Each stage runs under its own `gen_ai.*` span. Only the rewrite stage
//! has a recovery path; embedding, index, and generation errors propagate.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use pin_project_lite::pin_project;
use ragchat_types::chat::ChatMessage;
use ragchat_types::config::AppConfig;
use ragchat_types::error::ChatError;
use ragchat_types::llm::{CompletionRequest, LlmError, Message, StreamEvent, Usage};
use ragchat_types::retrieval::{RetrievalError, RetrievedChunk};
use tracing::{Instrument, debug, info, info_span};

use crate::llm::provider::{LlmProvider, LlmStream};
use crate::rag::prompt;
use crate::rag::rewrite::{RewriteSettings, rewrite_query};
use crate::retrieval::embedder::{EmbedKind, Embedder};
use crate::retrieval::index::VectorIndex;

/// Max output tokens for context-free generation.
const NO_CONTEXT_MAX_TOKENS: u32 = 1024;

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct RagSettings {
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub top_k: usize,
    pub min_score: Option<f32>,
    pub system_prompt_template: String,
    pub rewrite: RewriteSettings,
}

impl RagSettings {
    /// Build settings from config. `system_prompt` overrides the built-in
    /// tutor prompt (it is read from `llm.system_prompt_path` by the caller).
    pub fn from_config(config: &AppConfig, system_prompt: Option<String>) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            top_p: config.llm.top_p,
            max_tokens: config.llm.max_output_tokens,
            top_k: config.retrieval.top_k,
            min_score: config.retrieval.min_score,
            system_prompt_template: system_prompt
                .unwrap_or_else(|| prompt::DEFAULT_SYSTEM_PROMPT.to_string()),
            rewrite: RewriteSettings {
                enabled: config.rewrite.enabled,
                model: config
                    .rewrite
                    .model
                    .clone()
                    .unwrap_or_else(|| config.llm.model.clone()),
                temperature: config.rewrite.temperature,
                max_tokens: config.rewrite.max_output_tokens,
            },
        }
    }
}

/// Everything needed to generate an answer, computed before generation.
#[derive(Debug, Clone)]
pub struct PreparedAnswer {
    pub request: CompletionRequest,
    pub rewritten_query: String,
    pub sources: Vec<RetrievedChunk>,
}

/// A generated answer and how it was produced.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub answer: String,
    pub rewritten_query: String,
    pub sources: Vec<RetrievedChunk>,
    pub usage: Usage,
}

/// Retrieval-augmented generation over an LLM, an embedder, and a vector index.
///
/// Generic over the three ports; the server instantiates it with the
/// `Box*` wrappers, tests with mocks.
pub struct RagPipeline<P: LlmProvider, E: Embedder, V: VectorIndex> {
    provider: P,
    embedder: E,
    index: V,
    settings: RagSettings,
}

impl<P: LlmProvider, E: Embedder, V: VectorIndex> RagPipeline<P, E, V> {
    pub fn new(provider: P, embedder: E, index: V, settings: RagSettings) -> Self {
        Self {
            provider,
            embedder,
            index,
            settings,
        }
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn index(&self) -> &V {
        &self.index
    }

    /// Embed `query` and fetch the best-matching chunks.
    ///
    /// Matches with empty text carry nothing for the prompt and are dropped,
    /// as are matches under `min_score` when one is configured.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>, ChatError> {
        let embed_span = info_span!(
            "gen_ai.embed_query",
            gen_ai.request.model = %self.embedder.model_name(),
        );
        let mut vectors = self
            .embedder
            .embed(&[query.to_string()], EmbedKind::Query)
            .instrument(embed_span)
            .await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| RetrievalError::Embedding("no vector returned for query".to_string()))?;

        let retrieve_span = info_span!("gen_ai.retrieve", top_k = self.settings.top_k);
        let matches = self
            .index
            .query(&vector, self.settings.top_k)
            .instrument(retrieve_span)
            .await?;

        let total = matches.len();
        let kept: Vec<RetrievedChunk> = matches
            .into_iter()
            .filter(|m| !m.text.trim().is_empty())
            .filter(|m| self.settings.min_score.is_none_or(|min| m.score >= min))
            .collect();
        debug!(total, kept = kept.len(), "Retrieved context chunks");
        Ok(kept)
    }

    /// Run every stage except generation.
    ///
    /// `history` holds the turns before `question`; the question itself
    /// must not be in it.
    pub async fn prepare(
        &self,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<PreparedAnswer, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::Validation("message is required".to_string()));
        }

        let prior = prompt::history_messages(history);
        let rewritten_query =
            rewrite_query(&self.provider, &self.settings.rewrite, question, &prior).await;

        let sources = self.retrieve(&rewritten_query).await?;
        let context = prompt::build_context(&sources);
        let system = prompt::render_system_prompt(&self.settings.system_prompt_template, &context);

        let mut messages = prior;
        messages.push(Message::user(rewritten_query.clone()));

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            system: Some(system),
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
            top_p: Some(self.settings.top_p),
            stream: false,
            stop_sequences: None,
        };

        Ok(PreparedAnswer {
            request,
            rewritten_query,
            sources,
        })
    }

    /// Answer `question` given prior turns.
    pub async fn answer(
        &self,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<RagAnswer, ChatError> {
        let prepared = self.prepare(question, history).await?;

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %prepared.request.model,
            gen_ai.request.max_tokens = prepared.request.max_tokens,
            gen_ai.request.temperature = ?prepared.request.temperature,
            gen_ai.request.stream = false,
        );
        let response = self
            .provider
            .complete(&prepared.request)
            .instrument(span)
            .await?;

        info!(
            sources = prepared.sources.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Answer generated"
        );

        Ok(RagAnswer {
            answer: response.content,
            rewritten_query: prepared.rewritten_query,
            sources: prepared.sources,
            usage: response.usage,
        })
    }

    /// Stream the generation for a prepared request.
    pub fn stream(&self, prepared: &PreparedAnswer) -> LlmStream {
        let mut request = prepared.request.clone();
        request.stream = true;

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = true,
        );
        let inner = {
            let _enter = span.enter();
            self.provider.stream(request)
        };
        Box::pin(StreamInSpan { inner, span })
    }

    /// Plain generation with no retrieval and no system prompt.
    pub async fn ask_without_context(&self, prompt: &str) -> Result<String, ChatError> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::user(prompt)],
            system: None,
            max_tokens: NO_CONTEXT_MAX_TOKENS,
            temperature: Some(self.settings.temperature),
            top_p: None,
            stream: false,
            stop_sequences: None,
        };
        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.stream = false,
        );
        let response = self.provider.complete(&request).instrument(span).await?;
        Ok(response.content)
    }
}

pin_project! {
    /// Keeps a span entered while the wrapped stream is polled, so the span
    /// covers the whole streaming duration rather than stream construction.
    struct StreamInSpan {
        #[pin]
        inner: LlmStream,
        span: tracing::Span,
    }
}

impl Stream for StreamInSpan {
    type Item = Result<StreamEvent, LlmError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let _enter = this.span.enter();
        this.inner.poll_next(cx)
    }
}
