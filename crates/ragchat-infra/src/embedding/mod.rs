//! Embedding model clients.

pub mod gemini;
