//! Shared domain types for ragchat.
//!
//! Chat transcripts, user accounts, LLM request/response shapes, retrieval
//! records, outgoing mail, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod mail;
pub mod retrieval;
pub mod user;
