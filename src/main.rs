//! User Service
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────────▶ ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!                        │ http server  │──▶│ metrics      │──▶│  handlers    │
//!                        │ (axum)       │   │ middleware   │   │ validate/map │
//!                        └──────────────┘   └──────┬───────┘   └──────┬───────┘
//!                                                  │                  │
//!                                                  ▼                  ▼
//!                                          ┌──────────────┐   ┌──────────────┐
//!                                          │ prometheus   │   │  UserStore   │
//!                                          │ registry     │   │ pg / memory  │
//!                                          └──────────────┘   └──────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use user_service::config::{self, ServiceConfig};
use user_service::lifecycle::{self, signals, Shutdown};
use user_service::observability::logging;

#[derive(Parser)]
#[command(name = "user-service")]
#[command(about = "HTTP CRUD service for user records", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults and environment are used without it.
    #[arg(short, long, env = "USER_SERVICE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config: ServiceConfig = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_from_env()?,
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("user-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        driver = ?config.database.driver,
        request_timeout_secs = config.timeouts.request_secs,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );

    // A store that cannot be reached is fatal: nothing is served.
    let server = lifecycle::build_server(config.clone()).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let signal = signals::wait_for_termination().await;
        tracing::info!(signal, "Termination signal received");
        signal_shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
