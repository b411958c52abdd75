//! Vector index trait.
//!
//! The index itself is a hosted service (Pinecone); this port only covers
//! the calls the application makes against it.

use ragchat_types::retrieval::{EmbeddedChunk, RetrievalError, RetrievedChunk};

/// Trait for a similarity-search index over document chunks.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in ragchat-infra.
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` chunks nearest to `vector`, best match first.
    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<RetrievedChunk>, RetrievalError>> + Send;

    /// Insert or overwrite chunks by id. Returns how many were written.
    fn upsert(
        &self,
        chunks: &[EmbeddedChunk],
    ) -> impl std::future::Future<Output = Result<usize, RetrievalError>> + Send;

    /// Ids of every stored chunk whose id starts with `prefix`.
    fn list_ids(
        &self,
        prefix: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RetrievalError>> + Send;

    /// Remove chunks by id. Unknown ids are ignored.
    fn delete(
        &self,
        ids: &[String],
    ) -> impl std::future::Future<Output = Result<(), RetrievalError>> + Send;
}
