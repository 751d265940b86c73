// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parlor serve` command implementation.
//!
//! Wires configuration into the full stack: SQLite store (with
//! migrations), directory HTTP client, allocation engine, Prometheus
//! recorder, and the gateway server. Runs until ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use parlor_config::ParlorConfig;
use parlor_core::ParlorError;
use parlor_directory::DirectoryClient;
use parlor_engine::{AllocationEngine, EngineConfig};
use parlor_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig, start_server};
use parlor_store::Database;
use tracing::{info, warn};

/// Runs the `parlor serve` command.
pub async fn run_serve(config: ParlorConfig) -> Result<(), ParlorError> {
    init_tracing(&config.service.log_level);

    info!("starting parlor serve");

    if config.directory.api_url.trim().is_empty() {
        return Err(ParlorError::Config(
            "directory.api_url must be configured for serve".to_string(),
        ));
    }

    // Storage: migrations run on open.
    let db = Database::open_with_options(&config.storage.database_path, config.storage.wal_mode)
        .await?;
    info!(path = %config.storage.database_path, "store ready");

    // External agent directory client.
    let directory = Arc::new(DirectoryClient::new(&config.directory)?);

    // The allocation engine.
    let engine = Arc::new(AllocationEngine::new(
        db.clone(),
        directory,
        EngineConfig::from_allocation(&config.allocation),
    ));

    // Metrics: serve keeps running without them if the recorder fails.
    let prometheus_render = match parlor_prometheus::install_recorder() {
        Ok(handle) => {
            let handle = Arc::new(handle);
            Some(Arc::new(move || handle.render()) as Arc<dyn Fn() -> String + Send + Sync>)
        }
        Err(e) => {
            warn!(error = %e, "metrics disabled");
            None
        }
    };

    let state = GatewayState {
        engine,
        auth: AuthConfig {
            bearer_token: config.service.bearer_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render,
        },
        rescan_timeout: Duration::from_secs(config.allocation.rescan_timeout_secs),
    };

    let server_config = ServerConfig {
        host: config.service.host.clone(),
        port: config.service.port,
    };

    tokio::select! {
        result = start_server(&server_config, state) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    db.close().await?;
    info!("parlor stopped");
    Ok(())
}

/// Initialize the tracing subscriber from config, with `RUST_LOG` taking
/// precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
