//! HTTP/REST API layer for ragchat.
//!
//! Axum-based REST API under `/api/` with bearer-token authentication
//! and CORS restricted to the web client's origin.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
