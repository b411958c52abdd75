//! Document indexer.
//!
//! Loads `.txt` / `.md` / `.pdf` files (recursing into directories), chunks
//! them, embeds the chunks in batches, and upserts the batches to the vector
//! index with bounded concurrency. PDFs are read one page at a time and each
//! chunk remembers its page. Chunk ids are derived from the source path, so
//! indexing the same file again overwrites its previous chunks; ids left over
//! from a longer previous version are deleted afterwards.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, instrument, warn};

use ragchat_core::retrieval::embedder::{EmbedKind, Embedder};
use ragchat_core::retrieval::index::VectorIndex;
use ragchat_types::config::IndexingConfig;
use ragchat_types::retrieval::{ChunkRecord, EmbeddedChunk, RetrievalError};

use super::chunker::{Chunker, ChunkerError};
use crate::crypto::token::sha256_hex;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "pdf"];

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract text from {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error(transparent)]
    Chunker(#[from] ChunkerError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// What an indexing run did.
#[derive(Debug, Default, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub files: usize,
    pub chunks: usize,
    pub upserted: usize,
    /// Chunks removed because their source now yields fewer chunks.
    pub stale_removed: usize,
    /// Paths that were not indexed (unsupported type, unreadable, or empty).
    pub skipped: Vec<PathBuf>,
    pub dry_run: bool,
}

/// Text of one loaded document. PDFs yield one per page.
struct Page {
    number: Option<u32>,
    text: String,
}

/// Chunks produced from one file.
struct FileChunks {
    prefix: String,
    records: Vec<ChunkRecord>,
}

/// Indexes documents into a vector index.
pub struct Indexer<'a, E: Embedder, V: VectorIndex> {
    embedder: &'a E,
    index: &'a V,
    chunker: Chunker,
    batch_size: usize,
    max_concurrency: usize,
}

impl<'a, E: Embedder, V: VectorIndex> Indexer<'a, E, V> {
    pub fn new(embedder: &'a E, index: &'a V, config: &IndexingConfig) -> Result<Self, IndexError> {
        Ok(Self {
            embedder,
            index,
            chunker: Chunker::from_config(config)?,
            batch_size: config.batch_size.max(1),
            max_concurrency: config.max_concurrency.max(1),
        })
    }

    /// Index every supported file under `paths`. With `dry_run`, files are
    /// loaded and chunked but nothing is embedded or written.
    #[instrument(skip(self, paths), fields(paths = paths.len()))]
    pub async fn run(&self, paths: &[PathBuf], dry_run: bool) -> Result<IndexReport, IndexError> {
        let mut report = IndexReport {
            dry_run,
            ..Default::default()
        };

        let mut files = Vec::new();
        for path in collect_files(paths, &mut report.skipped)? {
            let pages = match load_pages(&path).await {
                Ok(pages) => pages,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                    report.skipped.push(path);
                    continue;
                }
            };

            let file = self.chunks_for(&path, &pages);
            if file.records.is_empty() {
                report.skipped.push(path);
                continue;
            }
            debug!(
                path = %path.display(),
                pages = pages.len(),
                chunks = file.records.len(),
                "Chunked file"
            );
            report.files += 1;
            report.chunks += file.records.len();
            files.push(file);
        }

        if dry_run || files.is_empty() {
            info!(files = report.files, chunks = report.chunks, dry_run, "Indexing finished");
            return Ok(report);
        }

        let records: Vec<&ChunkRecord> = files.iter().flat_map(|f| &f.records).collect();
        let batches: Vec<Vec<ChunkRecord>> = records
            .chunks(self.batch_size)
            .map(|batch| batch.iter().map(|r| (*r).clone()).collect())
            .collect();

        let counts: Vec<usize> = stream::iter(batches)
            .map(|batch| self.embed_and_upsert(batch))
            .buffer_unordered(self.max_concurrency)
            .try_collect()
            .await?;
        report.upserted = counts.into_iter().sum();

        for file in &files {
            report.stale_removed += self.remove_stale(file).await?;
        }

        info!(
            files = report.files,
            chunks = report.chunks,
            upserted = report.upserted,
            stale_removed = report.stale_removed,
            "Indexing finished"
        );
        Ok(report)
    }

    fn chunks_for(&self, path: &Path, pages: &[Page]) -> FileChunks {
        let source = path.to_string_lossy().replace('\\', "/");
        let prefix = chunk_id_prefix(&source);
        let records = pages
            .iter()
            .flat_map(|page| {
                self.chunker
                    .chunk(path, &page.text)
                    .into_iter()
                    .map(move |text| (page.number, text))
            })
            .enumerate()
            .map(|(i, (page, text))| ChunkRecord {
                id: format!("{prefix}-{i}"),
                text,
                source: source.clone(),
                chunk_index: i as u32,
                page,
            })
            .collect();
        FileChunks { prefix, records }
    }

    /// Delete ids under the file's prefix that this run did not write.
    async fn remove_stale(&self, file: &FileChunks) -> Result<usize, IndexError> {
        let current: HashSet<&str> = file.records.iter().map(|r| r.id.as_str()).collect();
        let stale: Vec<String> = self
            .index
            .list_ids(&format!("{}-", file.prefix))
            .await?
            .into_iter()
            .filter(|id| !current.contains(id.as_str()))
            .collect();
        if !stale.is_empty() {
            debug!(prefix = %file.prefix, stale = stale.len(), "Removing stale chunks");
            self.index.delete(&stale).await?;
        }
        Ok(stale.len())
    }

    async fn embed_and_upsert(&self, batch: Vec<ChunkRecord>) -> Result<usize, IndexError> {
        let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();
        let vectors = self.embedder.embed(&texts, EmbedKind::Document).await?;
        let chunks: Vec<EmbeddedChunk> = batch
            .into_iter()
            .zip(vectors)
            .map(|(record, vector)| EmbeddedChunk { record, vector })
            .collect();
        Ok(self.index.upsert(&chunks).await?)
    }
}

/// Read a file as pages: one per PDF page, or a single page of UTF-8 text.
async fn load_pages(path: &Path) -> Result<Vec<Page>, IndexError> {
    let io_err = |source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    };

    if !has_extension(path, "pdf") {
        let text = tokio::fs::read_to_string(path).await.map_err(io_err)?;
        return Ok(vec![Page { number: None, text }]);
    }

    let bytes = tokio::fs::read(path).await.map_err(io_err)?;
    let pdf_err = |message: String| IndexError::Pdf {
        path: path.to_path_buf(),
        message,
    };
    // Extraction is CPU-bound and can panic on malformed input; the blocking
    // task turns a panic into a JoinError.
    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| pdf_err(e.to_string()))?
    .map_err(pdf_err)?;

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page {
            number: Some(i as u32 + 1),
            text,
        })
        .collect())
}

/// First 12 hex chars of SHA-256 over the source path.
pub fn chunk_id_prefix(source: &str) -> String {
    sha256_hex(source)[..12].to_string()
}

/// Expand `paths` into a sorted list of supported files.
/// Missing paths are an error; unsupported files are recorded in `skipped`.
fn collect_files(paths: &[PathBuf], skipped: &mut Vec<PathBuf>) -> Result<Vec<PathBuf>, IndexError> {
    let mut files = Vec::new();
    for path in paths {
        let meta = std::fs::metadata(path).map_err(|source| IndexError::Io {
            path: path.clone(),
            source,
        })?;
        if meta.is_dir() {
            walk_dir(path, &mut files, skipped)?;
        } else if is_supported(path) {
            files.push(path.clone());
        } else {
            skipped.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, skipped: &mut Vec<PathBuf>) -> Result<(), IndexError> {
    let entries = std::fs::read_dir(dir).map_err(|source| IndexError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| IndexError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
        {
            continue;
        }
        if path.is_dir() {
            walk_dir(&path, files, skipped)?;
        } else if is_supported(&path) {
            files.push(path);
        } else {
            skipped.push(path);
        }
    }
    Ok(())
}

fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
