//! `ragchat serve`: run the HTTP API until Ctrl+C or SIGTERM.

use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use tracing::{info, warn};

use crate::http::router::build_router;
use crate::state::AppState;

const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub async fn serve(state: AppState, quiet: bool) -> Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        addr = %addr,
        frontend = %state.config.server.frontend_url,
        model = %state.config.llm.model,
        "ragchat API listening"
    );
    if !quiet {
        println!();
        println!(
            "  {} ragchat API listening on {}",
            style("⚡").bold(),
            style(format!("http://{addr}")).cyan()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
        println!();
    }

    let purge = tokio::spawn(purge_expired_tokens(state.clone()));

    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    purge.abort();
    info!("Server stopped");
    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Delete expired bearer tokens at startup and then hourly.
async fn purge_expired_tokens(state: AppState) {
    let mut ticker = tokio::time::interval(TOKEN_PURGE_INTERVAL);
    loop {
        ticker.tick().await;
        match state.auth_service.purge_expired_tokens().await {
            Ok(0) => {}
            Ok(n) => info!(purged = n, "Expired tokens removed"),
            Err(e) => warn!(error = %e, "Token purge failed"),
        }
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
