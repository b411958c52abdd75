//! Gemini embedding client (`batchEmbedContents`).
//!
//! Queries and documents are embedded with different task types
//! (`RETRIEVAL_QUERY` / `RETRIEVAL_DOCUMENT`), which the model uses to place
//! questions near the passages that answer them.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ragchat_core::retrieval::embedder::{EmbedKind, Embedder};
use ragchat_types::config::EmbeddingConfig;
use ragchat_types::retrieval::RetrievalError;

/// Upper bound on texts per `batchEmbedContents` call.
const MAX_BATCH: usize = 100;

/// Gemini text embedder.
///
/// Does NOT derive Debug: it holds the API key.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

fn task_type(kind: EmbedKind) -> &'static str {
    match kind {
        EmbedKind::Query => "RETRIEVAL_QUERY",
        EmbedKind::Document => "RETRIEVAL_DOCUMENT",
    }
}

impl GeminiEmbedder {
    pub fn new(config: &EmbeddingConfig, api_key: SecretString) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RetrievalError::Embedding(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.trim_start_matches("models/").to_string(),
            dimension: config.dimension,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:batchEmbedContents", self.base_url, self.model)
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        kind: EmbedKind,
    ) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let model = format!("models/{}", self.model);
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: &model,
                    content: Content {
                        parts: [Part { text }],
                    },
                    task_type: task_type(kind),
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Embedding(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Embedding(format!("HTTP {status}: {error_body}")));
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Embedding(format!("failed to parse response: {e}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(RetrievalError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        parsed
            .embeddings
            .into_iter()
            .map(|e| {
                if e.values.len() == self.dimension {
                    Ok(e.values)
                } else {
                    Err(RetrievalError::DimensionMismatch {
                        expected: self.dimension,
                        actual: e.values.len(),
                    })
                }
            })
            .collect()
    }
}

impl Embedder for GeminiEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        kind: EmbedKind,
    ) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            debug!(model = %self.model, count = batch.len(), ?kind, "Embedding batch");
            vectors.extend(self.embed_batch(batch, kind).await?);
        }
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    /// Serves a fake `batchEmbedContents`: each vector is `[len(text), task flag, 0...]`.
    async fn spawn_fake(dimension: usize) -> String {
        let app = Router::new().route(
            "/v1beta/models/{call}",
            post(move |Path(call): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
                if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
                    return (StatusCode::FORBIDDEN, Json(json!({"error": "bad key"})));
                }
                assert_eq!(call, "text-embedding-004:batchEmbedContents");
                let embeddings: Vec<Value> = body["requests"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|r| {
                        let text = r["content"]["parts"][0]["text"].as_str().unwrap();
                        let flag = if r["taskType"] == "RETRIEVAL_QUERY" { 1.0 } else { 2.0 };
                        let mut values = vec![0.0f32; dimension];
                        values[0] = text.len() as f32;
                        values[1] = flag;
                        json!({ "values": values })
                    })
                    .collect();
                (StatusCode::OK, Json(json!({ "embeddings": embeddings })))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/v1beta")
    }

    fn embedder(base_url: String, dimension: usize, key: &str) -> GeminiEmbedder {
        let config = EmbeddingConfig {
            model: "text-embedding-004".to_string(),
            dimension,
            base_url,
        };
        GeminiEmbedder::new(&config, SecretString::from(key.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_embed_preserves_order_and_task_type() {
        let base = spawn_fake(4).await;
        let embedder = embedder(base, 4, "test-key");

        let texts = vec!["a".to_string(), "abc".to_string()];
        let vectors = embedder.embed(&texts, EmbedKind::Document).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0][0], 1.0);
        assert_eq!(vectors[1][0], 3.0);
        assert_eq!(vectors[0][1], 2.0);

        let query = embedder
            .embed(&["what is a heap".to_string()], EmbedKind::Query)
            .await
            .unwrap();
        assert_eq!(query[0][1], 1.0);
    }

    #[tokio::test]
    async fn test_embed_splits_large_inputs_into_batches() {
        let base = spawn_fake(4).await;
        let embedder = embedder(base, 4, "test-key");
        let texts: Vec<String> = (0..250).map(|i| "x".repeat(i % 7 + 1)).collect();
        let vectors = embedder.embed(&texts, EmbedKind::Document).await.unwrap();
        assert_eq!(vectors.len(), 250);
        assert_eq!(vectors[249][0], (249 % 7 + 1) as f32);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_reported() {
        let base = spawn_fake(4).await;
        let embedder = embedder(base, 768, "test-key");
        let err = embedder
            .embed(&["hi".to_string()], EmbedKind::Query)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 768,
                actual: 4
            }
        ));
    }

    #[tokio::test]
    async fn test_http_error_is_surfaced() {
        let base = spawn_fake(4).await;
        let embedder = embedder(base, 4, "wrong-key");
        let err = embedder
            .embed(&["hi".to_string()], EmbedKind::Query)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_model_prefix_is_normalized() {
        let config = EmbeddingConfig {
            model: "models/text-embedding-004".to_string(),
            ..Default::default()
        };
        let embedder = GeminiEmbedder::new(&config, SecretString::from("k".to_string())).unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-004");
        assert!(embedder.url().ends_with("/models/text-embedding-004:batchEmbedContents"));
    }
}
