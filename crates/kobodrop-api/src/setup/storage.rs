//! Storage setup and initialization

use anyhow::Result;
use kobodrop_core::{Config, StorageBackend};
use kobodrop_services::{BlobFetcher, HttpBlobFetcher, StorageBlobFetcher};
use kobodrop_storage::{create_storage, Storage};
use std::sync::Arc;
use std::time::Duration;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config).await?;
    tracing::info!(
        backend = %storage.backend_type(),
        "Storage abstraction initialized successfully"
    );
    Ok(storage)
}

/// Pick how proxied downloads read blobs.
///
/// Local blobs are read from disk since their download URL points back at this
/// server. Object store blobs are fetched from their public URL.
pub fn setup_fetcher(config: &Config, storage: Arc<dyn Storage>) -> Result<Arc<dyn BlobFetcher>> {
    match storage.backend_type() {
        StorageBackend::Local => Ok(Arc::new(StorageBlobFetcher::new(storage))),
        StorageBackend::S3 => {
            let fetcher =
                HttpBlobFetcher::new(Duration::from_secs(config.upstream_timeout_secs))?;
            Ok(Arc::new(fetcher))
        }
    }
}
