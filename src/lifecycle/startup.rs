//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect the configured store and make sure it answers
//! - Build the metrics registry
//! - Assemble the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, the service never serves
//!   traffic without a working store
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use metrics_exporter_prometheus::BuildError;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{DatabaseConfig, DatabaseDriver, ServiceConfig};
use crate::http::HttpServer;
use crate::observability::PrometheusMetrics;
use crate::store::{MemoryUserStore, PostgresUserStore, StoreError, UserStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to connect to database: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build metrics registry: {0}")]
    Metrics(#[from] BuildError),
}

/// Open the configured store, run migrations when asked, and ping it.
pub async fn connect_store(config: &DatabaseConfig) -> Result<Arc<dyn UserStore>, StartupError> {
    let store: Arc<dyn UserStore> = match config.driver {
        DatabaseDriver::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryUserStore::new())
        }
        DatabaseDriver::Postgres => {
            let store = PostgresUserStore::connect(config).await?;
            if config.run_migrations {
                store.migrate().await?;
            }
            Arc::new(store)
        }
    };

    store.ping().await?;
    Ok(store)
}

/// Build a ready-to-run server from a validated configuration.
pub async fn build_server(config: ServiceConfig) -> Result<HttpServer, StartupError> {
    let store = connect_store(&config.database).await?;

    let exporter = if config.observability.metrics_enabled {
        Some(Arc::new(PrometheusMetrics::new(
            &config.observability.latency_buckets,
        )?))
    } else {
        tracing::info!("Request metrics disabled");
        None
    };

    Ok(HttpServer::new(config, store, exporter))
}
