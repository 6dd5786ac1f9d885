use async_trait::async_trait;
use kobodrop_core::models::{FileMetadata, NewFileMetadata};
use kobodrop_core::AppError;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::traits::FileRepository;

#[derive(Clone, Default)]
pub struct MemoryFileRepository {
    files: Arc<RwLock<HashMap<Uuid, FileMetadata>>>,
}

impl MemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed record, bypassing id assignment.
    pub async fn put(&self, file: FileMetadata) {
        self.files.write().await.insert(file.id, file);
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl FileRepository for MemoryFileRepository {
    async fn insert(&self, file: NewFileMetadata) -> Result<FileMetadata, AppError> {
        let stored = file.into_record();
        self.files.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileMetadata>, AppError> {
        Ok(self.files.read().await.get(&id).cloned())
    }

    async fn list_by_session(&self, session_id: Uuid) -> Result<Vec<FileMetadata>, AppError> {
        let mut files: Vec<FileMetadata> = self
            .files
            .read()
            .await
            .values()
            .filter(|f| f.session_id == session_id)
            .cloned()
            .collect();
        files.sort_by_key(|f| (Reverse(f.uploaded_at), f.id));
        Ok(files)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.files.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn new_file(session_id: Uuid, name: &str, age_minutes: i64) -> NewFileMetadata {
        NewFileMetadata {
            id: None,
            session_id,
            name: name.to_string(),
            size: 10,
            content_type: "application/pdf".to_string(),
            storage_path: format!("uploads/{}/x/{}", session_id, name),
            download_url: format!("http://localhost/media/{}", name),
            uploaded_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn lists_newest_first_and_scoped_to_session() {
        let repo = MemoryFileRepository::new();
        let session_id = Uuid::new_v4();
        repo.insert(new_file(session_id, "old.pdf", 30)).await.unwrap();
        repo.insert(new_file(session_id, "new.pdf", 1)).await.unwrap();
        repo.insert(new_file(session_id, "mid.pdf", 10)).await.unwrap();
        repo.insert(new_file(Uuid::new_v4(), "other.pdf", 0))
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_by_session(session_id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["new.pdf", "mid.pdf", "old.pdf"]);
        assert!(repo.list_by_session(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keeps_pre_assigned_id() {
        let repo = MemoryFileRepository::new();
        let file_id = Uuid::new_v4();
        let mut file = new_file(Uuid::new_v4(), "a.pdf", 0);
        file.id = Some(file_id);

        let stored = repo.insert(file).await.unwrap();
        assert_eq!(stored.id, file_id);
        assert_eq!(repo.get(file_id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = MemoryFileRepository::new();
        let stored = repo.insert(new_file(Uuid::new_v4(), "a.pdf", 0)).await.unwrap();

        repo.delete(stored.id).await.unwrap();
        repo.delete(stored.id).await.unwrap();
        repo.delete(Uuid::new_v4()).await.unwrap();
        assert!(repo.is_empty().await);
    }
}
