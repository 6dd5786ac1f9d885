//! Application state shared by every handler.
//!
//! Components receive their store handles here, once, so tests can build the
//! same state over in-memory repositories and a temporary directory.

use std::sync::Arc;

use kobodrop_core::{Config, UploadValidator};
use kobodrop_db::{FileRepository, SessionRepository};
use kobodrop_services::{
    BlobFetcher, BlobTransfer, DownloadDispatcher, FileRegistry, KoboListing, SessionStore,
};
use kobodrop_storage::Storage;

/// Record store handles
#[derive(Clone)]
pub struct Repositories {
    pub sessions: Arc<dyn SessionRepository>,
    pub files: Arc<dyn FileRepository>,
}

/// Dependencies probed by the health endpoints
#[derive(Clone)]
pub struct HealthProbes {
    pub sessions: Arc<dyn SessionRepository>,
    pub storage: Arc<dyn Storage>,
    pub database_backed: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub registry: FileRegistry,
    pub transfer: BlobTransfer,
    pub downloads: DownloadDispatcher,
    pub listing: KoboListing,
    pub validator: UploadValidator,
    pub health: HealthProbes,
}

impl AppState {
    pub fn new(
        config: Config,
        repositories: Repositories,
        storage: Arc<dyn Storage>,
        fetcher: Arc<dyn BlobFetcher>,
    ) -> Self {
        let sessions = SessionStore::new(
            repositories.sessions.clone(),
            config.session_ttl(),
            config.max_code_attempts,
        );
        let registry = FileRegistry::new(repositories.files.clone());
        let transfer = BlobTransfer::new(storage.clone()).with_max_bytes(config.max_file_size_bytes);
        let downloads = DownloadDispatcher::new(registry.clone(), fetcher, config.proxy_max_bytes);
        let listing = KoboListing::new(sessions.clone(), registry.clone(), config.proxy_max_bytes);
        let validator = UploadValidator::new(
            config.max_file_size_bytes,
            config.allowed_extensions.clone(),
        );
        let health = HealthProbes {
            sessions: repositories.sessions,
            storage,
            database_backed: config.database_url.is_some(),
        };

        Self {
            config,
            sessions,
            registry,
            transfer,
            downloads,
            listing,
            validator,
            health,
        }
    }
}
