//! LLM provider abstractions.
//!
//! - `LlmProvider`: RPITIT trait for concrete chat-completion backends
//! - `BoxLlmProvider`: object-safe wrapper chosen at startup from config

pub mod box_provider;
pub mod provider;
