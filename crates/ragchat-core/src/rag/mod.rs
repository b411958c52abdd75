//! Retrieval-augmented answering.
//!
//! - `rewrite`: standalone-question rewriting with fallback to the original
//! - `prompt`: context block and system prompt assembly
//! - `pipeline`: the end-to-end `RagPipeline`
//! - `turn`: one persisted question/answer exchange within a session

pub mod pipeline;
pub mod prompt;
pub mod rewrite;
pub mod turn;
