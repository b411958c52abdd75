//! Infrastructure layer for ragchat.
//!
//! Implementations of the ports defined in `ragchat-core`: SQLite storage,
//! the OpenAI-compatible LLM client, Gemini embeddings, the Pinecone index,
//! Gmail delivery, password and token cryptography, plus config and secret
//! loading and the document indexer.

pub mod config;
pub mod crypto;
pub mod embedding;
pub mod indexing;
pub mod llm;
pub mod mail;
pub mod secret;
pub mod sqlite;
pub mod vector_index;
