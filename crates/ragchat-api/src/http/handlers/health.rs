//! GET /api/health (no auth required).

use axum::Json;
use serde_json::{Value, json};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "DSA RAG Backend is running!",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
