//! File Registry
//!
//! Session-scoped file metadata. The registry never validates what it stores;
//! validation happens at the upload boundary.

use std::sync::Arc;

use kobodrop_core::models::{FileMetadata, NewFileMetadata};
use kobodrop_core::AppError;
use kobodrop_db::FileRepository;
use uuid::Uuid;

use crate::session::into_store_failure;

#[derive(Clone)]
pub struct FileRegistry {
    repository: Arc<dyn FileRepository>,
}

impl FileRegistry {
    pub fn new(repository: Arc<dyn FileRepository>) -> Self {
        Self { repository }
    }

    /// Persist a record. A pre-assigned `file.id` is kept, otherwise one is assigned.
    #[tracing::instrument(skip(self, file), fields(operation = "add_file_metadata", session_id = %file.session_id))]
    pub async fn add_metadata(&self, file: NewFileMetadata) -> Result<FileMetadata, AppError> {
        let stored = self
            .repository
            .insert(file)
            .await
            .map_err(into_store_failure)?;
        tracing::info!(
            file_id = %stored.id,
            size_bytes = stored.size,
            "File registered"
        );
        Ok(stored)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<FileMetadata>, AppError> {
        self.repository.get(id).await.map_err(into_store_failure)
    }

    /// Files of a session, newest first. An unknown session has no files.
    pub async fn list_by_session(&self, session_id: Uuid) -> Result<Vec<FileMetadata>, AppError> {
        self.repository
            .list_by_session(session_id)
            .await
            .map_err(into_store_failure)
    }

    /// Remove a record; removing an unknown id succeeds.
    #[tracing::instrument(skip(self), fields(operation = "delete_file_metadata", file_id = %id))]
    pub async fn delete_metadata(&self, id: Uuid) -> Result<(), AppError> {
        self.repository
            .delete(id)
            .await
            .map_err(into_store_failure)
    }
}
