//! Business logic and port definitions for ragchat.
//!
//! This crate defines the traits the infrastructure layer implements
//! (repositories, LLM provider, embedder, vector index, mailer) and the
//! services built on them. It depends only on `ragchat-types` -- never on
//! `ragchat-infra` or any database/IO crate.

pub mod auth;
pub mod chat;
pub mod llm;
pub mod mail;
pub mod rag;
pub mod retrieval;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
