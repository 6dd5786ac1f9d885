//! Repository traits
//!
//! Store failures surface as `AppError::Database` or `AppError::TransientStore`;
//! a missing record is `Ok(None)`, never an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kobodrop_core::models::{FileMetadata, NewFileMetadata, NewSession, Session};
use kobodrop_core::AppError;
use uuid::Uuid;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session and return it with its assigned id.
    async fn insert(&self, session: NewSession) -> Result<Session, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Session>, AppError>;

    /// Exact match on `code`. When several sessions share a code the most
    /// recently created one wins.
    async fn find_by_code(&self, code: &str) -> Result<Option<Session>, AppError>;

    /// Overwrite `expires_at`. Updating a missing session is a no-op.
    async fn update_expires_at(&self, id: Uuid, expires_at: DateTime<Utc>)
        -> Result<(), AppError>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Store file metadata and return it with its assigned id.
    async fn insert(&self, file: NewFileMetadata) -> Result<FileMetadata, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<FileMetadata>, AppError>;

    /// All files of a session, newest `uploaded_at` first.
    async fn list_by_session(&self, session_id: Uuid) -> Result<Vec<FileMetadata>, AppError>;

    /// Remove a record. Deleting a missing id succeeds.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}
