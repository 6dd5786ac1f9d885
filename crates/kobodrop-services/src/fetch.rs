//! Upstream blob fetching for the proxied download path.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use kobodrop_core::models::FileMetadata;
use kobodrop_core::AppError;
use kobodrop_storage::{Storage, StorageError};

/// Response body forwarded chunk by chunk. An `Err` item aborts the response.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

pub struct FetchedBlob {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

#[async_trait]
pub trait BlobFetcher: Send + Sync {
    /// Open the blob behind `file`. Unreachable or failing upstreams are
    /// `AppError::Transfer`.
    async fn fetch(&self, file: &FileMetadata) -> Result<FetchedBlob, AppError>;
}

/// Fetches `download_url` over HTTP.
#[derive(Clone)]
pub struct HttpBlobFetcher {
    client: reqwest::Client,
}

impl HttpBlobFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BlobFetcher for HttpBlobFetcher {
    #[tracing::instrument(skip(self, file), fields(operation = "fetch_blob", file_id = %file.id))]
    async fn fetch(&self, file: &FileMetadata) -> Result<FetchedBlob, AppError> {
        let response = self
            .client
            .get(&file.download_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reach blob upstream");
                AppError::Transfer(format!("Failed to fetch file: {}", e))
            })?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "Blob upstream returned an error status");
            return Err(AppError::Transfer(format!(
                "Upstream returned status {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());
        let content_length = response.content_length();

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));

        Ok(FetchedBlob {
            content_type,
            content_length,
            body: Box::pin(body),
        })
    }
}

/// Reads the blob straight from the storage backend by `storage_path`.
///
/// Used with the local backend, whose download URL points back at this server.
#[derive(Clone)]
pub struct StorageBlobFetcher {
    storage: Arc<dyn Storage>,
}

impl StorageBlobFetcher {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl BlobFetcher for StorageBlobFetcher {
    #[tracing::instrument(skip(self, file), fields(operation = "fetch_blob", file_id = %file.id))]
    async fn fetch(&self, file: &FileMetadata) -> Result<FetchedBlob, AppError> {
        let stream = self
            .storage
            .download_stream(&file.storage_path)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, storage_path = %file.storage_path, "Failed to open blob");
                AppError::Transfer(e.to_string())
            })?;

        let body = stream.map(|chunk| chunk.map_err(storage_to_io));
        let content_type = Some(file.content_type.clone()).filter(|ct| !ct.is_empty());

        Ok(FetchedBlob {
            content_type,
            content_length: Some(file.size),
            body: Box::pin(body),
        })
    }
}

fn storage_to_io(err: StorageError) -> std::io::Error {
    match err {
        StorageError::IoError(io) => io,
        other => std::io::Error::other(other.to_string()),
    }
}
