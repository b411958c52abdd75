//! BoxEmbedder -- object-safe dynamic dispatch wrapper for Embedder.
//!
//! Same blanket-impl pattern as BoxLlmProvider.

use std::future::Future;
use std::pin::Pin;

use ragchat_types::retrieval::RetrievalError;

use super::embedder::{EmbedKind, Embedder};

type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send + 'a>>;

pub trait EmbedderDyn: Send + Sync {
    fn embed_boxed<'a>(&'a self, texts: &'a [String], kind: EmbedKind) -> EmbedFuture<'a>;

    fn model_name_dyn(&self) -> &str;

    fn dimension_dyn(&self) -> usize;
}

impl<T: Embedder> EmbedderDyn for T {
    fn embed_boxed<'a>(&'a self, texts: &'a [String], kind: EmbedKind) -> EmbedFuture<'a> {
        Box::pin(self.embed(texts, kind))
    }

    fn model_name_dyn(&self) -> &str {
        self.model_name()
    }

    fn dimension_dyn(&self) -> usize {
        self.dimension()
    }
}

/// Type-erased embedder for runtime selection.
pub struct BoxEmbedder {
    inner: Box<dyn EmbedderDyn + Send + Sync>,
}

impl BoxEmbedder {
    pub fn new<T: Embedder + 'static>(embedder: T) -> Self {
        Self {
            inner: Box::new(embedder),
        }
    }
}

impl Embedder for BoxEmbedder {
    fn embed(
        &self,
        texts: &[String],
        kind: EmbedKind,
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send {
        async move { self.inner.embed_boxed(texts, kind).await }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name_dyn()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension_dyn()
    }
}
