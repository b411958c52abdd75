//! Document indexing: load files, chunk, embed, upsert.

pub mod chunker;
pub mod indexer;
