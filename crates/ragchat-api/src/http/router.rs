//! Axum router configuration with middleware.
//!
//! All routes are under `/api/`. Middleware: CORS limited to the configured
//! frontend origin, request tracing.

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.frontend_url);

    let auth_routes = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me));

    let chat_routes = Router::new()
        .route("/message", post(handlers::chat::send_message))
        .route("/message/stream", post(handlers::chat::stream_message))
        .route("/history/{session_id}", get(handlers::chat::get_history))
        .route("/session", post(handlers::chat::create_session))
        .route("/sessions", get(handlers::chat::list_sessions))
        .route("/session/{session_id}", get(handlers::chat::get_session))
        .route("/save", post(handlers::chat::save_message))
        .route("/download", post(handlers::chat::download_chat));

    let contact_routes = Router::new().route("/discuss", post(handlers::contact::discuss));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/chat", chat_routes)
        .nest("/contact", contact_routes)
        .route("/health", get(handlers::health::health_check));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the web client. Credentials are allowed, so the origin must be
/// explicit; an unparsable origin allows none.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(frontend_url, error = %e, "Invalid frontend origin, CORS disabled");
            cors
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use ragchat_core::llm::box_provider::BoxLlmProvider;
    use ragchat_core::mail::mailer::BoxMailer;
    use ragchat_core::rag::pipeline::{RagPipeline, RagSettings};
    use ragchat_core::retrieval::box_embedder::BoxEmbedder;
    use ragchat_core::retrieval::box_index::BoxVectorIndex;
    use ragchat_core::testing::{MockEmbedder, MockIndex, MockLlm, RecordingMailer};
    use ragchat_infra::sqlite::pool::DatabasePool;
    use ragchat_types::config::AppConfig;
    use ragchat_types::retrieval::RetrievedChunk;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        llm: MockLlm,
        mailer: RecordingMailer,
        _dir: tempfile::TempDir,
    }

    async fn harness(llm: MockLlm) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();

        let mut config = AppConfig::default();
        config.mail.team_address = Some("team@example.com".to_string());

        let index = MockIndex::with_chunks(vec![RetrievedChunk {
            id: "dsa-0".to_string(),
            score: 0.9,
            text: "A stack is a LIFO structure.".to_string(),
            source: Some("stacks.md".to_string()),
        }]);
        let rag = RagPipeline::new(
            BoxLlmProvider::new(llm.clone()),
            BoxEmbedder::new(MockEmbedder::new(8)),
            BoxVectorIndex::new(index),
            RagSettings::from_config(&config, None),
        );
        let mailer = RecordingMailer::default();
        let state =
            AppState::assemble(config, pool, rag, BoxMailer::new(mailer.clone())).unwrap();

        Harness {
            router: build_router(state),
            llm,
            mailer,
            _dir: dir,
        }
    }

    async fn call(
        router: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn call_json(
        router: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, text) = call(router, method, uri, token, body).await;
        (status, serde_json::from_str(&text).unwrap())
    }

    async fn signup(router: &Router, email: &str) -> String {
        let (status, body) = call_json(
            router,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "name": "Ada", "email": email, "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_check() {
        let h = harness(MockLlm::default()).await;
        let (status, body) = call_json(&h.router, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_signup_login_me() {
        let h = harness(MockLlm::default()).await;
        signup(&h.router, "ada@example.com").await;

        let (status, body) = call_json(
            &h.router,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap();
        assert!(token.starts_with("rc_"));

        let (status, body) = call_json(&h.router, Method::GET, "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "ada@example.com");

        let (status, body) = call_json(
            &h.router,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-one" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid email or password");
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let h = harness(MockLlm::default()).await;
        signup(&h.router, "ada@example.com").await;
        let (status, _) = call_json(
            &h.router,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_chat_routes_require_token() {
        let h = harness(MockLlm::default()).await;
        let (status, body) =
            call_json(&h.router, Method::GET, "/api/chat/sessions", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) =
            call_json(&h.router, Method::GET, "/api/chat/sessions", Some("rc_bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_message_then_history() {
        let h = harness(MockLlm::replying(["Push and pop happen at the top."])).await;
        let token = signup(&h.router, "ada@example.com").await;

        let (status, body) = call_json(
            &h.router,
            Method::POST,
            "/api/chat/message",
            Some(&token),
            Some(json!({ "message": "How does a stack work?", "sessionId": "s1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Push and pop happen at the top.");
        assert_eq!(body["sessionId"], "s1");

        let system = h.llm.requests()[0].system.clone().unwrap();
        assert!(system.contains("A stack is a LIFO structure."));

        let (status, body) =
            call_json(&h.router, Method::GET, "/api/chat/history/s1", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sessionId"], "s1");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "How does a stack work?");
        assert_eq!(messages[1]["role"], "assistant");

        let (_, body) =
            call_json(&h.router, Method::GET, "/api/chat/session/s1", Some(&token), None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_message_requires_fields() {
        let h = harness(MockLlm::default()).await;
        let token = signup(&h.router, "ada@example.com").await;
        let (status, body) = call_json(
            &h.router,
            Method::POST,
            "/api/chat/message",
            Some(&token),
            Some(json!({ "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message and sessionId are required");
    }

    #[tokio::test]
    async fn test_generation_failure_is_500_and_persists_nothing() {
        let h = harness(MockLlm::failing()).await;
        let token = signup(&h.router, "ada@example.com").await;
        let (status, body) = call_json(
            &h.router,
            Method::POST,
            "/api/chat/message",
            Some(&token),
            Some(json!({ "message": "What is a queue?", "sessionId": "s1" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error processing message");

        let (_, body) =
            call_json(&h.router, Method::GET, "/api/chat/history/s1", Some(&token), None).await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_history_is_empty() {
        let h = harness(MockLlm::default()).await;
        let token = signup(&h.router, "ada@example.com").await;
        let (status, body) =
            call_json(&h.router, Method::GET, "/api/chat/history/nope", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "messages": [] }));
    }

    #[tokio::test]
    async fn test_sessions_are_private() {
        let h = harness(MockLlm::default()).await;
        let ada = signup(&h.router, "ada@example.com").await;
        let bob = signup(&h.router, "bob@example.com").await;

        let (status, _) = call_json(
            &h.router,
            Method::POST,
            "/api/chat/save",
            Some(&ada),
            Some(json!({ "sessionId": "shared", "role": "user", "content": "ada's note" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) =
            call_json(&h.router, Method::GET, "/api/chat/session/shared", Some(&bob), None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_create_and_list_sessions() {
        let h = harness(MockLlm::default()).await;
        let token = signup(&h.router, "ada@example.com").await;

        let (status, body) =
            call_json(&h.router, Method::POST, "/api/chat/session", Some(&token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let session_id = body["sessionId"].as_str().unwrap().to_string();
        assert!(session_id.starts_with("session_"));

        let (status, body) =
            call_json(&h.router, Method::GET, "/api/chat/sessions", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let sessions = body["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["sessionId"], session_id.as_str());
        assert_eq!(sessions[0]["messageCount"], 0);
    }

    #[tokio::test]
    async fn test_save_rejects_unknown_role() {
        let h = harness(MockLlm::default()).await;
        let token = signup(&h.router, "ada@example.com").await;
        let (status, _) = call_json(
            &h.router,
            Method::POST,
            "/api/chat/save",
            Some(&token),
            Some(json!({ "sessionId": "s1", "role": "narrator", "content": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_download_emails_transcript() {
        let h = harness(MockLlm::default()).await;
        let token = signup(&h.router, "ada@example.com").await;

        let (status, body) = call_json(
            &h.router,
            Method::POST,
            "/api/chat/download",
            Some(&token),
            Some(json!({ "sessionId": "s1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing sessionId or email");

        let (status, _) = call_json(
            &h.router,
            Method::POST,
            "/api/chat/download",
            Some(&token),
            Some(json!({ "sessionId": "s1", "email": "ada@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        call_json(
            &h.router,
            Method::POST,
            "/api/chat/save",
            Some(&token),
            Some(json!({ "sessionId": "s1", "role": "user", "content": "hi" })),
        )
        .await;
        let (status, body) = call_json(
            &h.router,
            Method::POST,
            "/api/chat/download",
            Some(&token),
            Some(json!({ "sessionId": "s1", "email": "ada@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attachments[0].filename, "chat.txt");
        assert_eq!(sent[0].attachments[0].data, b"Chat Session: s1\n\nUSER:\nhi\n\n");
    }

    #[tokio::test]
    async fn test_discuss_uses_account_identity() {
        let h = harness(MockLlm::default()).await;
        let token = signup(&h.router, "ada@example.com").await;

        let (status, body) = call_json(
            &h.router,
            Method::POST,
            "/api/contact/discuss",
            Some(&token),
            Some(json!({ "subject": "Graphs", "message": "Dijkstra vs A*?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "team@example.com");
        assert_eq!(sent[0].reply_to.as_deref(), Some("ada@example.com"));
        assert_eq!(sent[1].to, "ada@example.com");

        let (status, body) = call_json(
            &h.router,
            Method::POST,
            "/api/contact/discuss",
            Some(&token),
            Some(json!({ "subject": "", "message": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Subject and message are required");
    }

    #[tokio::test]
    async fn test_stream_emits_events_and_persists() {
        let h = harness(MockLlm::replying(["LIFO means last in, first out."])).await;
        let token = signup(&h.router, "ada@example.com").await;

        let (status, text) = call(
            &h.router,
            Method::POST,
            "/api/chat/message/stream",
            Some(&token),
            Some(json!({ "message": "What is LIFO?", "sessionId": "s1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("event: session"));
        assert!(text.contains("\"sessionId\":\"s1\""));
        assert!(text.contains("event: text_delta"));
        assert!(text.contains("event: done"));
        assert!(!text.contains("event: error"));

        let (_, body) =
            call_json(&h.router, Method::GET, "/api/chat/history/s1", Some(&token), None).await;
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["content"], "LIFO means last in, first out.");
    }

    #[tokio::test]
    async fn test_stream_failure_emits_error_and_saves_nothing() {
        let h = harness(MockLlm::interrupted("A queue is FIFO.")).await;
        let token = signup(&h.router, "ada@example.com").await;

        let (status, text) = call(
            &h.router,
            Method::POST,
            "/api/chat/message/stream",
            Some(&token),
            Some(json!({ "message": "What is a queue?", "sessionId": "s1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("event: text_delta"));
        assert!(text.contains("event: error"));
        assert!(text.contains("connection reset"));
        assert!(text.contains("event: done"));

        let (status, body) =
            call_json(&h.router, Method::GET, "/api/chat/history/s1", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["messages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_messages_keep_pairs_adjacent() {
        let h = harness(MockLlm::default()).await;
        let token = signup(&h.router, "ada@example.com").await;

        let sends = (0..6).map(|i| {
            let router = h.router.clone();
            let token = token.clone();
            async move {
                call(
                    &router,
                    Method::POST,
                    "/api/chat/message",
                    Some(&token),
                    Some(json!({ "message": format!("Question {i}"), "sessionId": "s1" })),
                )
                .await
            }
        });
        for (status, _) in futures_util::future::join_all(sends).await {
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) =
            call_json(&h.router, Method::GET, "/api/chat/history/s1", Some(&token), None).await;
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 12);
        for pair in messages.chunks(2) {
            assert_eq!(pair[0]["role"], "user");
            assert_eq!(pair[1]["role"], "assistant");
        }
    }
}
