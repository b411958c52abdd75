//! BoxLlmProvider -- object-safe dynamic dispatch wrapper for LlmProvider.
//!
//! 1. `LlmProviderDyn` is an object-safe mirror of `LlmProvider` with boxed futures
//! 2. A blanket impl covers every `T: LlmProvider`
//! 3. `BoxLlmProvider` wraps `Box<dyn LlmProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use ragchat_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities};

use super::provider::{LlmProvider, LlmStream};

pub trait LlmProviderDyn: Send + Sync {
    fn name_dyn(&self) -> &str;

    fn capabilities_dyn(&self) -> &ProviderCapabilities;

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

    fn stream_boxed(&self, request: CompletionRequest) -> LlmStream;
}

impl<T: LlmProvider> LlmProviderDyn for T {
    fn name_dyn(&self) -> &str {
        LlmProvider::name(self)
    }

    fn capabilities_dyn(&self) -> &ProviderCapabilities {
        LlmProvider::capabilities(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }

    fn stream_boxed(&self, request: CompletionRequest) -> LlmStream {
        self.stream(request)
    }
}

/// Type-erased LLM provider for runtime provider selection.
///
/// `LlmProvider` uses RPITIT and cannot be a trait object directly, so this
/// wrapper exposes the same methods over an inner `LlmProviderDyn`. It also
/// implements `LlmProvider` itself, so generic code accepts it unchanged.
pub struct BoxLlmProvider {
    inner: Box<dyn LlmProviderDyn + Send + Sync>,
}

impl BoxLlmProvider {
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }
}

impl LlmProvider for BoxLlmProvider {
    fn name(&self) -> &str {
        self.inner.name_dyn()
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        self.inner.capabilities_dyn()
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        async move { self.inner.complete_boxed(request).await }
    }

    fn stream(&self, request: CompletionRequest) -> LlmStream {
        self.inner.stream_boxed(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlm;
    use futures_util::StreamExt;
    use ragchat_types::llm::{Message, StreamEvent};

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "mock-model".to_string(),
            messages: vec![Message::user("hello")],
            system: None,
            max_tokens: 64,
            temperature: None,
            top_p: None,
            stream: false,
            stop_sequences: None,
        }
    }

    #[tokio::test]
    async fn test_boxed_provider_delegates() {
        let boxed = BoxLlmProvider::new(MockLlm::replying(["boxed reply"]));
        assert_eq!(boxed.name(), "mock");
        assert!(boxed.capabilities().streaming);

        let response = boxed.complete(&request()).await.unwrap();
        assert_eq!(response.content, "boxed reply");
    }

    #[tokio::test]
    async fn test_boxed_provider_streams() {
        let boxed = BoxLlmProvider::new(MockLlm::replying(["a b"]));
        let events: Vec<_> = boxed.stream(request()).collect().await;
        let text: String = events
            .into_iter()
            .filter_map(|e| match e {
                Ok(StreamEvent::TextDelta { text }) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(text, "a b");
    }
}
