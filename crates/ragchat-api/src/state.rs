//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both the CLI and
//! the REST API. Services are generic over their ports; AppState pins them
//! to the infra implementations, with the hosted backends behind `Box*`
//! wrappers so the provider can be chosen from config at startup.

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use secrecy::ExposeSecret;

use ragchat_core::auth::service::AuthService;
use ragchat_core::chat::service::ChatService;
use ragchat_core::llm::box_provider::BoxLlmProvider;
use ragchat_core::mail::mailer::BoxMailer;
use ragchat_core::mail::service::MailService;
use ragchat_core::rag::pipeline::{RagPipeline, RagSettings};
use ragchat_core::retrieval::box_embedder::BoxEmbedder;
use ragchat_core::retrieval::box_index::BoxVectorIndex;
use ragchat_infra::crypto::password::Argon2PasswordHasher;
use ragchat_infra::crypto::token::RandomTokenMinter;
use ragchat_infra::embedding::gemini::GeminiEmbedder;
use ragchat_infra::llm::create_provider;
use ragchat_infra::mail::create_mailer;
use ragchat_infra::secret::Secrets;
use ragchat_infra::sqlite::chat::SqliteChatRepository;
use ragchat_infra::sqlite::pool::DatabasePool;
use ragchat_infra::sqlite::user::{SqliteTokenRepository, SqliteUserRepository};
use ragchat_infra::vector_index::pinecone::PineconeIndex;
use ragchat_types::config::AppConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAuthService = AuthService<SqliteUserRepository, SqliteTokenRepository>;

pub type ConcreteChatService = ChatService<SqliteChatRepository>;

pub type ConcreteRagPipeline = RagPipeline<BoxLlmProvider, BoxEmbedder, BoxVectorIndex>;

pub type ConcreteMailService = MailService<BoxMailer>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_service: Arc<ConcreteAuthService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub rag: Arc<ConcreteRagPipeline>,
    pub mail_service: Arc<ConcreteMailService>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, build the hosted
    /// backends from config and secrets, wire services.
    pub async fn init(config: AppConfig, secrets: &Secrets) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::from_config(&config.database)
            .await
            .with_context(|| format!("failed to open database '{}'", config.database.url))?;

        let rag = build_pipeline(&config, secrets).await?;
        let mailer = create_mailer(&config.mail, secrets.gmail_credentials())
            .context("failed to configure mail transport")?;

        Self::assemble(config, db_pool, rag, mailer)
    }

    /// Wire services around an open pool and pre-built backends.
    pub fn assemble(
        config: AppConfig,
        db_pool: DatabasePool,
        rag: ConcreteRagPipeline,
        mailer: BoxMailer,
    ) -> anyhow::Result<Self> {
        let auth_service = AuthService::new(
            SqliteUserRepository::new(db_pool.clone()),
            SqliteTokenRepository::new(db_pool.clone()),
            Arc::new(Argon2PasswordHasher::new()?),
            Arc::new(RandomTokenMinter),
            Duration::hours(config.auth.token_ttl_hours),
        );
        let chat_service = ChatService::new(SqliteChatRepository::new(db_pool.clone()));
        let mail_service =
            MailService::new(mailer, config.mail.team_address().map(str::to_string));

        Ok(Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
            chat_service: Arc::new(chat_service),
            rag: Arc::new(rag),
            mail_service: Arc::new(mail_service),
            db_pool,
        })
    }
}

/// Build the RAG pipeline: LLM provider, Gemini embedder, Pinecone index,
/// and the system prompt (built-in unless `llm.system_prompt_path` is set).
pub async fn build_pipeline(
    config: &AppConfig,
    secrets: &Secrets,
) -> anyhow::Result<ConcreteRagPipeline> {
    let provider = create_provider(
        &config.llm,
        secrets
            .llm_api_key(config.llm.provider)
            .map(|key| key.expose_secret()),
    )
    .with_context(|| format!("failed to configure '{}' LLM provider", config.llm.provider))?;

    let embedder = build_embedder(config, secrets)?;
    let index = build_index(config, secrets)?;

    let system_prompt = match config.llm.system_prompt_path.as_deref() {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read system prompt {}", path.display()))?,
        ),
        None => None,
    };

    Ok(RagPipeline::new(
        provider,
        BoxEmbedder::new(embedder),
        BoxVectorIndex::new(index),
        RagSettings::from_config(config, system_prompt),
    ))
}

/// Gemini embedder; requires `GOOGLE_API_KEY`.
pub fn build_embedder(config: &AppConfig, secrets: &Secrets) -> anyhow::Result<GeminiEmbedder> {
    let google_key = secrets
        .google_api_key
        .clone()
        .context("GOOGLE_API_KEY is required for embeddings")?;
    Ok(GeminiEmbedder::new(&config.embedding, google_key)?)
}

/// Pinecone index client; requires `PINECONE_API_KEY` and an index host.
pub fn build_index(config: &AppConfig, secrets: &Secrets) -> anyhow::Result<PineconeIndex> {
    let pinecone_key = secrets
        .pinecone_api_key
        .clone()
        .context("PINECONE_API_KEY is required for retrieval")?;
    let index = PineconeIndex::new(&config.vector, pinecone_key)?;
    tracing::debug!(host = %index.host(), "Vector index configured");
    Ok(index)
}
