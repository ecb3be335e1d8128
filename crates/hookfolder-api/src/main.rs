//! hookfolder CLI and webhook server entry point.
//!
//! Binary name: `hookfolder`
//!
//! Loads `.env` and the TOML config, initializes tracing, then either starts
//! the webhook server or runs a one-shot maintenance command.

mod cli;
mod http;
mod state;

use clap::Parser;

use hookfolder_infra::config::load_config;
use hookfolder_observe::{init_tracing, shutdown_tracing, LogFormat};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set the environment directly.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let format = if cli.log_json { LogFormat::Json } else { LogFormat::Pretty };
    init_tracing(cli.log_directives(), format, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let mut config = load_config(&cli.config).await?;

    let result = match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            serve(config).await
        }
        Commands::Sign { file, algorithm } => cli::sign::run(&config, &file, algorithm).await,
        Commands::CheckConfig => cli::check::run(&config).await,
    };

    shutdown_tracing();
    result
}

async fn serve(config: hookfolder_types::config::AppConfig) -> anyhow::Result<()> {
    let state = AppState::init(&config).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, role = ?config.webhook.role, "hookfolder listening");

    let router = http::router::build_router(state.clone());

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Pending jobs are not persisted; they are dropped on shutdown.
    state.scheduler.shutdown();
    tracing::info!("server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
