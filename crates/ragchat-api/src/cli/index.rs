//! `ragchat index`: load documents into the vector index.

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use tracing::Instrument;

use ragchat_infra::indexing::indexer::{IndexReport, Indexer};
use ragchat_infra::secret::Secrets;
use ragchat_observe::genai_attrs::PROVIDER_PINECONE;
use ragchat_types::config::AppConfig;

use crate::state::{build_embedder, build_index};

pub async fn index(
    mut config: AppConfig,
    secrets: &Secrets,
    paths: Vec<PathBuf>,
    namespace: Option<String>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    if let Some(namespace) = namespace {
        config.vector.namespace = Some(namespace);
    }

    let embedder = build_embedder(&config, secrets)?;
    let index = build_index(&config, secrets)?;
    let indexer = Indexer::new(&embedder, &index, &config.indexing)
        .context("invalid indexing configuration")?;

    let span = tracing::info_span!(
        "index_documents",
        gen_ai.provider.name = PROVIDER_PINECONE,
        namespace = config.vector.namespace.as_deref().unwrap_or(""),
        dry_run,
    );
    let report = indexer
        .run(&paths, dry_run)
        .instrument(span)
        .await
        .context("indexing failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &IndexReport) {
    println!();
    if report.dry_run {
        println!("  {} Dry run, nothing uploaded", style("ℹ").blue().bold());
    } else {
        println!("  {} Indexing complete", style("✓").green().bold());
    }
    println!();
    println!("  Files:    {}", style(report.files).bold());
    println!("  Chunks:   {}", style(report.chunks).bold());
    if !report.dry_run {
        println!("  Upserted: {}", style(report.upserted).green());
        if report.stale_removed > 0 {
            println!("  Removed:  {} stale", style(report.stale_removed).yellow());
        }
    }
    if !report.skipped.is_empty() {
        println!();
        println!("  {}", style("── Skipped ──").dim());
        for path in &report.skipped {
            println!("  {} {}", style("•").yellow(), path.display());
        }
    }
    println!();
}
