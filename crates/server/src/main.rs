//! bounce-server: SmartLead bounce ingestion service.
//!
//! `serve` (default) runs the HTTP API with the daily scheduler.
//! `fetch` runs the pipeline once, prints the report and exits.

mod api;
mod router;
mod scheduler;
mod startup;
mod state;

#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use bounce_core::Config;
use bounce_ingest::TriggerKind;

// ── CLI ─────────────────────────────────────────────────────────────

/// Collect SmartLead bounces from the last days and serve them over HTTP.
#[derive(Parser, Debug)]
#[command(name = "bounce-server", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Start the HTTP server and the daily scheduler.
    Serve,
    /// Run one ingestion now, print the report as JSON, exit non-zero on error.
    Fetch,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    bounce_core::config::load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        Command::Fetch => fetch_once(&config).await,
    }
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = startup::build_app_state(config).await?;
    let scheduler = startup::start_scheduler(&state);
    let app = router::build_router(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler {
        handle.shutdown().await;
    }
    state.store.close().await;
    info!("bounce-server exited cleanly");
    Ok(())
}

async fn fetch_once(config: &Config) -> anyhow::Result<()> {
    let state = startup::build_app_state(config).await?;
    let report = state.orchestrator.run(TriggerKind::Manual).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    state.store.close().await;

    if report.is_error() {
        anyhow::bail!("ingestion run failed");
    }
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
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
    info!("shutdown signal received");
}
