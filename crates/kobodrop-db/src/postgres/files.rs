use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kobodrop_core::models::{FileMetadata, NewFileMetadata};
use kobodrop_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::traits::FileRepository;

#[derive(Clone)]
pub struct FileRepositoryPg {
    pool: PgPool,
}

impl FileRepositoryPg {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FileRow {
    id: Uuid,
    session_id: Uuid,
    name: String,
    size: i64,
    #[sqlx(rename = "type")]
    content_type: String,
    storage_path: String,
    download_url: String,
    uploaded_at: DateTime<Utc>,
}

impl TryFrom<FileRow> for FileMetadata {
    type Error = AppError;

    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        let size = u64::try_from(row.size).map_err(|_| {
            AppError::Internal(format!("File {} has negative size {}", row.id, row.size))
        })?;
        Ok(FileMetadata {
            id: row.id,
            session_id: row.session_id,
            name: row.name,
            size,
            content_type: row.content_type,
            storage_path: row.storage_path,
            download_url: row.download_url,
            uploaded_at: row.uploaded_at,
        })
    }
}

const FILE_COLUMNS: &str =
    "id, session_id, name, size, type, storage_path, download_url, uploaded_at";

#[async_trait]
impl FileRepository for FileRepositoryPg {
    #[tracing::instrument(skip(self, file), fields(db.table = "files", db.operation = "insert", session_id = %file.session_id))]
    async fn insert(&self, file: NewFileMetadata) -> Result<FileMetadata, AppError> {
        let size = i64::try_from(file.size).map_err(|_| {
            AppError::InvalidInput(format!("File size {} is out of range", file.size))
        })?;

        let query = format!(
            r#"
            INSERT INTO files (id, session_id, name, size, type, storage_path, download_url, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            FILE_COLUMNS
        );
        let row = sqlx::query_as::<Postgres, FileRow>(&query)
            .bind(file.id.unwrap_or_else(Uuid::new_v4))
            .bind(file.session_id)
            .bind(&file.name)
            .bind(size)
            .bind(&file.content_type)
            .bind(&file.storage_path)
            .bind(&file.download_url)
            .bind(file.uploaded_at)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<FileMetadata>, AppError> {
        let query = format!("SELECT {} FROM files WHERE id = $1", FILE_COLUMNS);
        let row = sqlx::query_as::<Postgres, FileRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(FileMetadata::try_from).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", session_id = %session_id))]
    async fn list_by_session(&self, session_id: Uuid) -> Result<Vec<FileMetadata>, AppError> {
        let query = format!(
            "SELECT {} FROM files WHERE session_id = $1 ORDER BY uploaded_at DESC, id",
            FILE_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, FileRow>(&query)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(FileMetadata::try_from).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
