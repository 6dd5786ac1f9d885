//! Record store setup
//!
//! With `DATABASE_URL` set, sessions and files live in Postgres. Without it they
//! live in process memory, which `Config::validate` only allows outside production.

use crate::state::Repositories;
use anyhow::Result;
use kobodrop_core::Config;
use kobodrop_db::{
    run_migrations, FileRepositoryPg, MemoryFileRepository, MemorySessionRepository,
    SessionRepositoryPg,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

pub async fn setup_repositories(config: &Config) -> Result<Repositories> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, keeping sessions and files in memory");
        return Ok(Repositories {
            sessions: Arc::new(MemorySessionRepository::new()),
            files: Arc::new(MemoryFileRepository::new()),
        });
    };

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database connected successfully"
    );

    run_migrations(&pool).await?;

    Ok(Repositories {
        sessions: Arc::new(SessionRepositoryPg::new(pool.clone())),
        files: Arc::new(FileRepositoryPg::new(pool)),
    })
}
