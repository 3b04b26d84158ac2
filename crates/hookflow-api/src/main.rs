//! Hookflow CLI and HTTP server entry point.
//!
//! Binary name: `hookflow`
//!
//! Parses CLI arguments, initializes tracing, database and services, then
//! dispatches to the command handler or starts the HTTP server.

mod cli;
mod http;
mod state;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use console::style;

use hookflow_infra::config::resolve_data_dir;
use hookflow_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_directive(), cli.otel).map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let data_dir = resolve_data_dir(cli.data_dir.clone());
    let state = AppState::init(&data_dir).await?;
    tracing::debug!(data_dir = %data_dir.display(), "application state ready");

    let result = match cli.command {
        Commands::Serve { port, host } => serve(state, host, port).await,
        Commands::Tool { action } => cli::tool::handle(&state, action, cli.json).await,
    };

    shutdown_tracing();
    result
}

async fn serve(state: AppState, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let grace = Duration::from_secs(state.config.dispatch.shutdown_grace_secs);
    let dispatcher = Arc::clone(&state.dispatcher);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Hookflow listening on {}",
        style("⚡").bold(),
        style(format!("http://{addr}")).cyan()
    );
    println!("  {}", style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(in_flight = dispatcher.in_flight(), ?grace, "draining dispatched work");
    if !dispatcher.shutdown(grace).await {
        tracing::warn!("dispatched work still running after grace period; cancelled");
    }

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    tracing::info!("shutdown signal received");
}
