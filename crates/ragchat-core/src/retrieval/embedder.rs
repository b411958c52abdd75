//! Embedder trait for text-to-vector conversion.

use ragchat_types::retrieval::RetrievalError;

/// What the text will be used for. Some embedding models produce different
/// vectors for search queries and for indexed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    Query,
    Document,
}

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in ragchat-infra.
pub trait Embedder: Send + Sync {
    /// Embed one or more texts into vectors, one vector per input, in order.
    fn embed(
        &self,
        texts: &[String],
        kind: EmbedKind,
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send;

    /// The model name used for embeddings (e.g., "text-embedding-004").
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
