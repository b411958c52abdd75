//! Application configuration types for ragchat.
//!
//! `AppConfig` mirrors `ragchat.toml`. Every section and field has a default,
//! so an empty file (or no file at all) yields a working configuration for
//! local development. Secrets never live here; they come from the environment.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub rewrite: RewriteConfig,
    pub embedding: EmbeddingConfig,
    pub vector: VectorConfig,
    pub retrieval: RetrievalConfig,
    pub mail: MailConfig,
    pub auth: AuthConfig,
    pub indexing: IndexingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS (the web client).
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://ragchat.db?mode=rwc".to_string(),
        }
    }
}

/// Which chat-completions backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderKind {
    /// Gemini through its OpenAI-compatible endpoint.
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    /// Any other OpenAI-compatible server; requires `base_url`.
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

impl fmt::Display for LlmProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProviderKind::Gemini => write!(f, "gemini"),
            LlmProviderKind::OpenAi => write!(f, "openai"),
            LlmProviderKind::OpenAiCompatible => write!(f, "openai_compatible"),
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: u32,
    /// Optional file overriding the built-in tutor prompt. `{context}` is
    /// replaced with the retrieved passages.
    pub system_prompt_path: Option<PathBuf>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Gemini,
            base_url: None,
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            top_p: 0.95,
            max_output_tokens: 2048,
            system_prompt_path: None,
        }
    }
}

/// Query rewrite settings. `model = None` reuses the generation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    pub enabled: bool,
    pub model: Option<String>,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: None,
            temperature: 0.3,
            max_output_tokens: 150,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    pub base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-004".to_string(),
            dimension: 768,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// Pinecone index location. `index_host` is the per-index data-plane host
/// shown in the Pinecone console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub index_host: Option<String>,
    pub namespace: Option<String>,
    pub api_version: String,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            index_host: None,
            namespace: None,
            api_version: "2025-01".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Matches scoring below this are dropped. `None` keeps everything.
    pub min_score: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_score: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailTransport {
    Gmail,
    /// Log outgoing mail instead of sending it.
    #[default]
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub transport: MailTransport,
    pub sender_name: String,
    pub sender_address: Option<String>,
    /// Where discussion requests are delivered. Defaults to the sender.
    pub team_address: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransport::Log,
            sender_name: "DSA Assistant".to_string(),
            sender_address: None,
            team_address: None,
        }
    }
}

impl MailConfig {
    pub fn team_address(&self) -> Option<&str> {
        self.team_address
            .as_deref()
            .or(self.sender_address.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: 24 * 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks per embedding request.
    pub batch_size: usize,
    /// Embed+upsert batches in flight at once.
    pub max_concurrency: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            batch_size: 50,
            max_concurrency: 5,
        }
    }
}
