//! PhotoSwipe Daemon
//!
//! Background service that holds user sessions and exposes the PhotoSwipe
//! actions over a local JSON-RPC socket.
//!
//! # Running
//!
//! ```bash
//! cargo run -p photoswipe-daemon -- --config ./daemon.toml
//! # or after install:
//! photoswiped
//! ```

use anyhow::Result;
use clap::Parser;
use photoswipe_daemon::{load_config, start_server, ApiState, DaemonConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "photoswiped", version, about = "PhotoSwipe daemon")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    init_logging(&config.log_level);

    info!("Starting PhotoSwipe daemon...");
    info!("Loaded configuration from {:?}", config.config_path);

    run_daemon(config).await
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run_daemon(config: DaemonConfig) -> Result<()> {
    info!("Daemon starting on {:?}", config.socket_path);

    let state = ApiState::from_config(&config)?;

    let server_handle = start_server(&config.socket_path, state).await?;

    info!("Daemon running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping server...");

    server_handle.stop().await?;
    server_handle.stopped().await;

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
        info!("Socket file removed");
    }

    info!("Daemon stopped");
    Ok(())
}
