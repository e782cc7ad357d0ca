//! Keysweep Server
//!
//! Accepts bounded brute-force searches over HTTP, runs them on an in-process
//! worker pool, and answers progress queries.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Registry: In-memory job store shared by every component
//! - Scheduler: Worker pool, search workers, retention sweep
//! - Services: Dispatcher (submit/cancel) and status queries
//! - API: axum router on top of the services

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod matcher;
pub mod registry;
pub mod scheduler;
pub mod service;

use crate::api::AppState;
use crate::config::Config;
use crate::registry::Registry;
use crate::scheduler::{PooledExecutor, SearchWorker, retention};
use crate::service::{Dispatcher, StatusService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keysweep_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Keysweep Server...");

    let config = load_config()?;
    info!(
        "Loaded configuration: max_parallel_jobs={}, max_length_limit={}, matcher={:?}",
        config.max_parallel_jobs, config.max_length_limit, config.matcher
    );

    let registry = Arc::new(Registry::new());
    let worker = Arc::new(SearchWorker::new(
        Arc::clone(&registry),
        config.matcher.build(),
        config.worker_settings(),
    ));
    let executor = Arc::new(PooledExecutor::new(
        Arc::clone(&registry),
        worker,
        config.max_parallel_jobs,
    ));

    let state = AppState {
        dispatcher: Arc::new(Dispatcher::new(
            Arc::clone(&registry),
            executor,
            config.max_length_limit,
        )),
        status: Arc::new(StatusService::new(Arc::clone(&registry))),
    };

    let _sweeper = config.retention.map(|retention| {
        retention::spawn_retention_sweeper(Arc::clone(&registry), retention, config.sweep_interval)
    });

    // Build router with all API endpoints
    let app = api::create_router(state);

    info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Loads configuration from environment variables
///
/// Unset variables take their defaults. A value that cannot be honoured
/// (an unknown matcher, a zero pool size) stops startup.
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
