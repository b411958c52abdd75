//! Semantic text chunker.
//!
//! Uses the `text-splitter` crate. Markdown files go through
//! `MarkdownSplitter` for heading-aware splitting; all other text uses
//! `TextSplitter`, which prefers paragraph, then sentence, then word
//! boundaries.

use std::path::Path;

use text_splitter::{ChunkConfig, MarkdownSplitter, TextSplitter};

use ragchat_types::config::IndexingConfig;

#[derive(Debug, thiserror::Error)]
#[error("invalid chunk settings: {0}")]
pub struct ChunkerError(String);

/// Splits document text into overlapping chunks of at most `chunk_size` characters.
pub struct Chunker {
    text: TextSplitter<text_splitter::Characters>,
    markdown: MarkdownSplitter<text_splitter::Characters>,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkerError> {
        if chunk_size == 0 {
            return Err(ChunkerError("chunk_size must be > 0".into()));
        }
        let config = || {
            ChunkConfig::new(chunk_size)
                .with_overlap(overlap)
                .map_err(|e| ChunkerError(e.to_string()))
        };
        Ok(Self {
            text: TextSplitter::new(config()?),
            markdown: MarkdownSplitter::new(config()?),
        })
    }

    pub fn from_config(config: &IndexingConfig) -> Result<Self, ChunkerError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Chunk `content`, choosing the splitter from `path`'s extension.
    /// Whitespace-only chunks are dropped.
    pub fn chunk(&self, path: &Path, content: &str) -> Vec<String> {
        let chunks: Vec<&str> = if is_markdown(path) {
            self.markdown.chunks(content).collect()
        } else {
            self.text.chunks(content).collect()
        };
        chunks
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
}
