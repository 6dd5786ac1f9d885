//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked object content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Upload source. The lifetime lets callers stream from borrowed readers such as
/// a multipart field.
pub type BoxedReader<'a> = Pin<Box<dyn AsyncRead + Send + 'a>>;

/// Outcome of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUpload {
    pub storage_key: String,
    /// URL a client can fetch the object from
    pub url: String,
    pub bytes_written: u64,
}

/// Storage abstraction trait
///
/// Callers choose the key (see [`crate::compute_storage_path`]); backends only
/// validate it. Deleting a missing object succeeds.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload from a reader, consuming it until EOF.
    ///
    /// `content_length` is a hint; the returned `bytes_written` is authoritative.
    async fn upload_stream<'a>(
        &self,
        storage_key: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: BoxedReader<'a>,
    ) -> StorageResult<StorageUpload>;

    /// Download a file as a stream of chunks
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Delete a file by its storage key
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Public URL of the object stored under `storage_key`
    fn public_url(&self, storage_key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
