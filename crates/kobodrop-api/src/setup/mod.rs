//! Application setup and initialization
//!
//! Builds the record store, blob storage, services and router from a `Config`.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::Result;
use kobodrop_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.base.environment,
        "Configuration loaded and validated successfully"
    );

    let repositories = database::setup_repositories(&config).await?;
    let storage = storage::setup_storage(&config).await?;
    let fetcher = storage::setup_fetcher(&config, storage.clone())?;

    let state = Arc::new(AppState::new(
        config.clone(),
        repositories,
        storage,
        fetcher,
    ));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
