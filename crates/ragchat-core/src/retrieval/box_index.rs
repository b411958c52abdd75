//! BoxVectorIndex -- object-safe dynamic dispatch wrapper for VectorIndex.

use std::future::Future;
use std::pin::Pin;

use ragchat_types::retrieval::{EmbeddedChunk, RetrievalError, RetrievedChunk};

use super::index::VectorIndex;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RetrievalError>> + Send + 'a>>;

pub trait VectorIndexDyn: Send + Sync {
    fn query_boxed<'a>(&'a self, vector: &'a [f32], top_k: usize)
    -> BoxFuture<'a, Vec<RetrievedChunk>>;

    fn upsert_boxed<'a>(&'a self, chunks: &'a [EmbeddedChunk]) -> BoxFuture<'a, usize>;

    fn list_ids_boxed<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Vec<String>>;

    fn delete_boxed<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, ()>;
}

impl<T: VectorIndex> VectorIndexDyn for T {
    fn query_boxed<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> BoxFuture<'a, Vec<RetrievedChunk>> {
        Box::pin(self.query(vector, top_k))
    }

    fn upsert_boxed<'a>(&'a self, chunks: &'a [EmbeddedChunk]) -> BoxFuture<'a, usize> {
        Box::pin(self.upsert(chunks))
    }

    fn list_ids_boxed<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Vec<String>> {
        Box::pin(self.list_ids(prefix))
    }

    fn delete_boxed<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, ()> {
        Box::pin(self.delete(ids))
    }
}

/// Type-erased vector index for runtime selection.
pub struct BoxVectorIndex {
    inner: Box<dyn VectorIndexDyn + Send + Sync>,
}

impl BoxVectorIndex {
    pub fn new<T: VectorIndex + 'static>(index: T) -> Self {
        Self {
            inner: Box::new(index),
        }
    }
}

impl VectorIndex for BoxVectorIndex {
    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> impl Future<Output = Result<Vec<RetrievedChunk>, RetrievalError>> + Send {
        async move { self.inner.query_boxed(vector, top_k).await }
    }

    fn upsert(
        &self,
        chunks: &[EmbeddedChunk],
    ) -> impl Future<Output = Result<usize, RetrievalError>> + Send {
        async move { self.inner.upsert_boxed(chunks).await }
    }

    fn list_ids(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<String>, RetrievalError>> + Send {
        async move { self.inner.list_ids_boxed(prefix).await }
    }

    fn delete(&self, ids: &[String]) -> impl Future<Output = Result<(), RetrievalError>> + Send {
        async move { self.inner.delete_boxed(ids).await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockIndex;
    use ragchat_types::retrieval::ChunkRecord;

    fn chunk(id: &str) -> EmbeddedChunk {
        EmbeddedChunk {
            record: ChunkRecord {
                id: id.to_string(),
                text: "text".to_string(),
                source: "notes.md".to_string(),
                chunk_index: 0,
                page: None,
            },
            vector: vec![0.0; 4],
        }
    }

    #[tokio::test]
    async fn test_boxed_index_delegates() {
        let index = BoxVectorIndex::new(MockIndex::default());
        assert_eq!(index.upsert(&[chunk("a-0"), chunk("a-1"), chunk("b-0")]).await.unwrap(), 3);

        let mut ids = index.list_ids("a-").await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a-0", "a-1"]);

        index.delete(&["a-1".to_string()]).await.unwrap();
        assert_eq!(index.list_ids("a-").await.unwrap(), vec!["a-0"]);
        assert!(index.query(&[0.0; 4], 3).await.unwrap().is_empty());
    }
}
