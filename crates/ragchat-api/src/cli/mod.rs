//! CLI command definitions for the `ragchat` binary.
//!
//! `ragchat serve` runs the HTTP API; `index` and `ask` work against the
//! same configuration without starting a server.

pub mod ask;
pub mod index;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Retrieval-augmented DSA tutor: API server and operator tools.
#[derive(Parser)]
#[command(name = "ragchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: $RAGCHAT_CONFIG or ./ragchat.toml).
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter used when RUST_LOG is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 if matches!(self.command, Commands::Serve { .. }) => "info",
            0 => "warn",
            1 => "info,ragchat=debug,ragchat_core=debug,ragchat_infra=debug,ragchat_api=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Address to bind (overrides `server.host`).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides `server.port` and PORT).
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Chunk, embed, and upsert documents into the vector index.
    Index {
        /// Files or directories (.txt, .md, .markdown, .pdf).
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Index namespace (overrides `vector.namespace`).
        #[arg(long)]
        namespace: Option<String>,

        /// Chunk and count without calling the embedding or index APIs.
        #[arg(long)]
        dry_run: bool,
    },

    /// Ask a single question from the terminal.
    Ask {
        /// The question.
        question: String,

        /// Skip retrieval and ask the model directly.
        #[arg(long)]
        no_context: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
