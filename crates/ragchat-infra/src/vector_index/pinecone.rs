//! Pinecone data-plane client.
//!
//! Talks to one index host (`https://<index>-<project>.svc.<env>.pinecone.io`)
//! over the REST API. Chunk text and source path ride along as metadata so a
//! query returns everything needed to build the prompt context. Id listing
//! by prefix backs stale-chunk cleanup when a document is re-indexed.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use ragchat_core::retrieval::index::VectorIndex;
use ragchat_types::config::VectorConfig;
use ragchat_types::retrieval::{EmbeddedChunk, RetrievalError, RetrievedChunk};

/// Vectors per upsert request, well under Pinecone's 2 MB payload limit at 768 dims.
const UPSERT_BATCH: usize = 100;
/// Pinecone's cap on ids per delete request.
const DELETE_BATCH: usize = 1000;
/// Page size for id listing (Pinecone's maximum).
const LIST_PAGE: usize = 100;

/// Pinecone-backed implementation of `VectorIndex`.
///
/// Does NOT derive Debug: it holds the API key.
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: SecretString,
    host: String,
    namespace: Option<String>,
    api_version: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    vectors: Vec<ListedId>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ListedId {
    id: String,
}

#[derive(Deserialize)]
struct Pagination {
    next: Option<String>,
}

impl Match {
    fn into_chunk(self) -> RetrievedChunk {
        let metadata = self.metadata.unwrap_or(Value::Null);
        RetrievedChunk {
            id: self.id,
            score: self.score,
            text: metadata["text"].as_str().unwrap_or_default().to_string(),
            source: metadata["source"].as_str().map(str::to_string),
        }
    }
}

impl PineconeIndex {
    /// Build a client for the configured index host.
    ///
    /// `PINECONE_INDEX_HOST` is applied to the config before this is called.
    pub fn new(config: &VectorConfig, api_key: SecretString) -> Result<Self, RetrievalError> {
        let host = config
            .index_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RetrievalError::Index("vector.index_host is not configured".into()))?;

        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RetrievalError::Index(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            host,
            namespace: config.namespace.clone().filter(|n| !n.is_empty()),
            api_version: config.api_version.clone(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RetrievalError> {
        let request = self.client.post(format!("{}{}", self.host, path)).json(body);
        self.send(request).await
    }

    async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<R, RetrievalError> {
        let request = self.client.get(format!("{}{}", self.host, path)).query(query);
        self.send(request).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<R, RetrievalError> {
        let response = request
            .header("Api-Key", self.api_key.expose_secret())
            .header("X-Pinecone-API-Version", &self.api_version)
            .send()
            .await
            .map_err(|e| RetrievalError::Index(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Index(format!("HTTP {status}: {error_body}")));
        }

        response
            .json()
            .await
            .map_err(|e| RetrievalError::Index(format!("failed to parse response: {e}")))
    }
}

impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };
        let response: QueryResponse = self.post("/query", &request).await?;
        debug!(matches = response.matches.len(), top_k, "Pinecone query");

        let mut chunks: Vec<RetrievedChunk> =
            response.matches.into_iter().map(Match::into_chunk).collect();
        chunks.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(chunks)
    }

    async fn upsert(&self, chunks: &[EmbeddedChunk]) -> Result<usize, RetrievalError> {
        let mut written = 0;
        for batch in chunks.chunks(UPSERT_BATCH) {
            let request = UpsertRequest {
                vectors: batch
                    .iter()
                    .map(|c| {
                        let mut metadata = serde_json::json!({
                            "text": c.record.text,
                            "source": c.record.source,
                            "chunk_index": c.record.chunk_index,
                        });
                        if let Some(page) = c.record.page {
                            metadata["page"] = page.into();
                        }
                        UpsertVector {
                            id: &c.record.id,
                            values: &c.vector,
                            metadata,
                        }
                    })
                    .collect(),
                namespace: self.namespace.as_deref(),
            };
            let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;
            written += response.upserted_count;
        }
        Ok(written)
    }

    async fn list_ids(&self, prefix: &str) -> Result<Vec<String>, RetrievalError> {
        let limit = LIST_PAGE.to_string();
        let mut ids = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page: ListResponse = {
                let mut query = vec![("prefix", prefix), ("limit", limit.as_str())];
                if let Some(namespace) = self.namespace.as_deref() {
                    query.push(("namespace", namespace));
                }
                if let Some(token) = token.as_deref() {
                    query.push(("paginationToken", token));
                }
                self.get("/vectors/list", &query).await?
            };
            ids.extend(page.vectors.into_iter().map(|v| v.id));
            match page.pagination.and_then(|p| p.next) {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }
        debug!(prefix, ids = ids.len(), "Pinecone list");
        Ok(ids)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), RetrievalError> {
        for batch in ids.chunks(DELETE_BATCH) {
            let request = DeleteRequest {
                ids: batch,
                namespace: self.namespace.as_deref(),
            };
            let _: Value = self.post("/vectors/delete", &request).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use std::collections::HashMap;

    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use ragchat_types::retrieval::ChunkRecord;
    use serde_json::json;

    #[derive(Clone, Default)]
    struct Fake {
        requests: Arc<Mutex<Vec<(String, Value)>>>,
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("Api-Key").and_then(|v| v.to_str().ok()) == Some("pc-key")
            && headers.get("X-Pinecone-API-Version").is_some()
    }

    async fn spawn_fake() -> (String, Fake) {
        let fake = Fake::default();
        let app = Router::new()
            .route(
                "/query",
                post(|State(f): State<Fake>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    if !authorized(&headers) {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad key"})));
                    }
                    f.requests.lock().unwrap().push(("query".into(), body));
                    (
                        StatusCode::OK,
                        Json(json!({
                            "matches": [
                                {"id": "b-0", "score": 0.42, "metadata": {"text": "Heaps are trees."}},
                                {"id": "a-1", "score": 0.91, "metadata": {"text": "Quicksort pivots.", "source": "sorting.md"}},
                            ]
                        })),
                    )
                }),
            )
            .route(
                "/vectors/upsert",
                post(|State(f): State<Fake>, Json(body): Json<Value>| async move {
                    let count = body["vectors"].as_array().map(Vec::len).unwrap_or(0);
                    f.requests.lock().unwrap().push(("upsert".into(), body));
                    Json(json!({ "upsertedCount": count }))
                }),
            )
            .route(
                "/vectors/list",
                get(|State(f): State<Fake>, Query(params): Query<HashMap<String, String>>| async move {
                    f.requests
                        .lock()
                        .unwrap()
                        .push(("list".into(), serde_json::to_value(&params).unwrap()));
                    let prefix = params.get("prefix").cloned().unwrap_or_default();
                    match params.get("paginationToken").map(String::as_str) {
                        None => Json(json!({
                            "vectors": [{"id": format!("{prefix}0")}, {"id": format!("{prefix}1")}],
                            "pagination": {"next": "page-2"},
                        })),
                        Some(_) => Json(json!({ "vectors": [{"id": format!("{prefix}2")}] })),
                    }
                }),
            )
            .route(
                "/vectors/delete",
                post(|State(f): State<Fake>, Json(body): Json<Value>| async move {
                    f.requests.lock().unwrap().push(("delete".into(), body));
                    Json(json!({}))
                }),
            )
            .with_state(fake.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), fake)
    }

    fn index(host: String, namespace: Option<&str>, key: &str) -> PineconeIndex {
        let config = VectorConfig {
            index_host: Some(host),
            namespace: namespace.map(str::to_string),
            ..Default::default()
        };
        PineconeIndex::new(&config, SecretString::from(key.to_string())).unwrap()
    }

    fn chunk(id: &str) -> EmbeddedChunk {
        EmbeddedChunk {
            record: ChunkRecord {
                id: id.to_string(),
                text: format!("text of {id}"),
                source: "notes/graphs.md".to_string(),
                chunk_index: 0,
                page: None,
            },
            vector: vec![0.1, 0.2, 0.3],
        }
    }

    #[test]
    fn test_host_gets_https_scheme() {
        let config = VectorConfig {
            index_host: Some("dsa-abc123.svc.aped-4627-b74a.pinecone.io/".to_string()),
            ..Default::default()
        };
        let index = PineconeIndex::new(&config, SecretString::from("k".to_string())).unwrap();
        assert_eq!(index.host(), "https://dsa-abc123.svc.aped-4627-b74a.pinecone.io");
    }

    #[test]
    fn test_missing_host_is_an_error() {
        let result = PineconeIndex::new(&VectorConfig::default(), SecretString::from("k".to_string()));
        assert!(matches!(result, Err(RetrievalError::Index(_))));
    }

    #[tokio::test]
    async fn test_query_maps_metadata_and_sorts_by_score() {
        let (host, fake) = spawn_fake().await;
        let index = index(host, Some("dsa"), "pc-key");

        let chunks = index.query(&[0.5, 0.5, 0.5], 10).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "a-1");
        assert_eq!(chunks[0].text, "Quicksort pivots.");
        assert_eq!(chunks[0].source.as_deref(), Some("sorting.md"));
        assert_eq!(chunks[1].source, None);

        let requests = fake.requests.lock().unwrap();
        let (_, body) = &requests[0];
        assert_eq!(body["topK"], 10);
        assert_eq!(body["includeMetadata"], true);
        assert_eq!(body["namespace"], "dsa");
    }

    #[tokio::test]
    async fn test_query_rejected_with_wrong_key() {
        let (host, _) = spawn_fake().await;
        let index = index(host, None, "wrong");
        let err = index.query(&[0.1], 3).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_upsert_batches_and_counts() {
        let (host, fake) = spawn_fake().await;
        let index = index(host, None, "pc-key");
        let chunks: Vec<EmbeddedChunk> = (0..150).map(|i| chunk(&format!("c-{i}"))).collect();

        let written = index.upsert(&chunks).await.unwrap();
        assert_eq!(written, 150);

        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let first = &requests[0].1;
        assert_eq!(first["vectors"].as_array().unwrap().len(), 100);
        assert_eq!(first["vectors"][0]["metadata"]["source"], "notes/graphs.md");
        assert!(first.get("namespace").is_none());
    }

    #[tokio::test]
    async fn test_delete_skips_empty_and_sends_ids() {
        let (host, fake) = spawn_fake().await;
        let index = index(host, None, "pc-key");

        index.delete(&[]).await.unwrap();
        assert!(fake.requests.lock().unwrap().is_empty());

        index.delete(&["c-1".to_string()]).await.unwrap();
        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests[0].0, "delete");
        assert_eq!(requests[0].1["ids"][0], "c-1");
    }

    #[tokio::test]
    async fn test_delete_splits_large_id_lists() {
        let (host, fake) = spawn_fake().await;
        let index = index(host, None, "pc-key");
        let ids: Vec<String> = (0..1500).map(|i| format!("c-{i}")).collect();

        index.delete(&ids).await.unwrap();
        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].1["ids"].as_array().unwrap().len(), 1000);
        assert_eq!(requests[1].1["ids"].as_array().unwrap().len(), 500);
    }

    #[tokio::test]
    async fn test_list_ids_follows_pagination() {
        let (host, fake) = spawn_fake().await;
        let index = index(host, Some("dsa"), "pc-key");

        let ids = index.list_ids("abc-").await.unwrap();
        assert_eq!(ids, vec!["abc-0", "abc-1", "abc-2"]);

        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].1["namespace"], "dsa");
        assert_eq!(requests[0].1["prefix"], "abc-");
        assert!(requests[0].1.get("paginationToken").is_none());
        assert_eq!(requests[1].1["paginationToken"], "page-2");
    }

    #[tokio::test]
    async fn test_upsert_sends_page_metadata() {
        let (host, fake) = spawn_fake().await;
        let index = index(host, None, "pc-key");
        let mut paged = chunk("p-0");
        paged.record.page = Some(3);

        index.upsert(&[paged, chunk("c-0")]).await.unwrap();
        let requests = fake.requests.lock().unwrap();
        let vectors = &requests[0].1["vectors"];
        assert_eq!(vectors[0]["metadata"]["page"], 3);
        assert!(vectors[1]["metadata"].get("page").is_none());
    }
}
