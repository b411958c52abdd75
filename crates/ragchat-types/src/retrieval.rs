//! Retrieval types: chunks going into the vector index and matches coming out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A chunk of source text prepared for indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Stable id; re-indexing the same source overwrites the same ids.
    pub id: String,
    pub text: String,
    /// Path or name of the document the chunk came from.
    pub source: String,
    pub chunk_index: u32,
    /// 1-based page number for chunks extracted from paginated documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// A chunk together with its embedding, ready for upsert.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub record: ChunkRecord,
    pub vector: Vec<f32>,
}

/// A match returned by a similarity query, highest score first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub score: f32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Errors from embedding or vector index calls.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector index error: {0}")]
    Index(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("missing credentials for {0}")]
    MissingCredentials(&'static str),
}
