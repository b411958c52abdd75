//! Hosted vector index clients.

pub mod pinecone;
