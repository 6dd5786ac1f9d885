//! Blob Transfer
//!
//! Streams uploads into storage under `uploads/{session_id}/{file_id}/{filename}`
//! and reports progress as bytes flow through.

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use kobodrop_core::models::UploadProgress;
use kobodrop_core::AppError;
use kobodrop_storage::{compute_storage_path, BoxedReader, Storage, StorageError};
use tokio::io::{AsyncRead, ReadBuf};
use uuid::Uuid;

/// Receives progress events on the task driving the upload.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Content to upload
pub struct UploadSource<'a> {
    pub filename: String,
    pub content_type: String,
    /// Expected length when the client declared one
    pub total_bytes: Option<u64>,
    pub reader: BoxedReader<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedBlob {
    pub storage_path: String,
    pub download_url: String,
    pub size: u64,
}

#[derive(Clone)]
pub struct BlobTransfer {
    storage: Arc<dyn Storage>,
    max_bytes: Option<u64>,
}

impl BlobTransfer {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            max_bytes: None,
        }
    }

    /// Abort uploads whose body grows past `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Upload `source` and return where it landed.
    ///
    /// `on_progress` sees non-decreasing `bytes_transferred` values and one final
    /// event after the store confirms the write. Nothing is reported once the
    /// upload has failed, and failures are not retried.
    #[tracing::instrument(
        skip(self, source, on_progress),
        fields(operation = "upload_blob", session_id = %session_id, file_id = %file_id)
    )]
    pub async fn upload(
        &self,
        session_id: Uuid,
        file_id: Uuid,
        source: UploadSource<'_>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadedBlob, AppError> {
        let storage_path = compute_storage_path(session_id, file_id, &source.filename);
        let counter = Arc::new(AtomicU64::new(0));
        let over_limit = Arc::new(AtomicBool::new(false));

        let reader = ProgressReader {
            inner: source.reader,
            transferred: counter.clone(),
            total_bytes: source.total_bytes,
            max_bytes: self.max_bytes,
            over_limit: over_limit.clone(),
            on_progress: on_progress.clone(),
        };

        let result = self
            .storage
            .upload_stream(
                &storage_path,
                &source.content_type,
                source.total_bytes,
                Box::pin(reader),
            )
            .await;

        let upload = match result {
            Ok(upload) => upload,
            Err(e) => {
                if over_limit.load(Ordering::SeqCst) {
                    return Err(AppError::PayloadTooLarge(format!(
                        "File exceeds the {} byte limit",
                        self.max_bytes.unwrap_or_default()
                    )));
                }
                tracing::error!(storage_path = %storage_path, error = %e, "Blob upload failed");
                return Err(AppError::Transfer(e.to_string()));
            }
        };

        let size = counter.load(Ordering::SeqCst).max(upload.bytes_written);
        if let Some(callback) = on_progress {
            callback(UploadProgress::complete(size));
        }

        Ok(UploadedBlob {
            storage_path: upload.storage_key,
            download_url: upload.url,
            size,
        })
    }

    /// Delete the blob at `storage_path`; a missing blob counts as deleted.
    #[tracing::instrument(skip(self), fields(operation = "delete_blob"))]
    pub async fn delete(&self, storage_path: &str) -> Result<(), AppError> {
        self.storage.delete(storage_path).await.map_err(|e| match e {
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Transfer(other.to_string()),
        })
    }
}

/// Counts bytes read from `inner`, reporting each advance.
struct ProgressReader<'a> {
    inner: BoxedReader<'a>,
    transferred: Arc<AtomicU64>,
    total_bytes: Option<u64>,
    max_bytes: Option<u64>,
    over_limit: Arc<AtomicBool>,
    on_progress: Option<ProgressCallback>,
}

impl AsyncRead for ProgressReader<'_> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();

        match this.inner.as_mut().poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let read = (buf.filled().len() - before) as u64;
                if read == 0 {
                    return Poll::Ready(Ok(()));
                }

                let transferred = this.transferred.fetch_add(read, Ordering::SeqCst) + read;
                if let Some(max) = this.max_bytes {
                    if transferred > max {
                        this.over_limit.store(true, Ordering::SeqCst);
                        return Poll::Ready(Err(io::Error::other("upload exceeds size limit")));
                    }
                }

                if let Some(callback) = &this.on_progress {
                    callback(UploadProgress::new(transferred, this.total_bytes));
                }
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}
