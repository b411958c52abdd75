//! ragchat CLI and REST API entry point.
//!
//! Binary name: `ragchat`
//!
//! Loads `.env` and the TOML config, resolves secrets from the environment,
//! then dispatches to the API server or one of the operator commands.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use ragchat_infra::config::load_effective_config;
use ragchat_infra::secret::Secrets;
use ragchat_observe::tracing_setup::{init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside development.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Shell completions don't need config or logging
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "ragchat", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.otel, cli.json, cli.default_log_filter())
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (config_path, mut config) = load_effective_config(cli.config.as_deref()).await;
    tracing::debug!(path = %config_path.display(), "Configuration resolved");

    let secrets = Secrets::from_env();

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            secrets.log_report();

            let state = AppState::init(config, &secrets).await?;
            cli::serve::serve(state, cli.quiet || cli.json).await?;
        }

        Commands::Index {
            paths,
            namespace,
            dry_run,
        } => {
            cli::index::index(config, &secrets, paths, namespace, dry_run, cli.json).await?;
        }

        Commands::Ask {
            question,
            no_context,
        } => {
            cli::ask::ask(config, &secrets, &question, no_context, cli.json).await?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}
