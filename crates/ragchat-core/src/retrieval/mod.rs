//! Retrieval ports: text embedding and the hosted vector index.
//!
//! Both are RPITIT traits implemented in ragchat-infra, each with a
//! `Box*` wrapper for runtime selection.

pub mod box_embedder;
pub mod box_index;
pub mod embedder;
pub mod index;
