use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use futures::TryStreamExt;
use kobodrop_core::models::{FileMetadata, NewFileMetadata, UploadProgress};
use kobodrop_core::AppError;
use kobodrop_services::{ProgressCallback, UploadSource, UploadedBlob};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::io::StreamReader;
use uuid::Uuid;

/// Name of the multipart field carrying the file
const FILE_FIELD: &str = "file";

/// Progress is logged every time another 8 MiB has arrived.
const PROGRESS_LOG_STEP: u64 = 8 * 1024 * 1024;

#[utoipa::path(
    post,
    path = "/api/v0/sessions/{id}/files",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded and registered", body = FileMetadata),
        (status = 400, description = "Missing file, bad filename or disallowed extension", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Transfer failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(session_id = %session_id, operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .sessions
        .get_by_id(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart data: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file = store_field(&state, session_id, field).await?;
        return Ok((StatusCode::CREATED, Json(file)));
    }

    Err(AppError::InvalidInput("No file provided".to_string()).into())
}

/// Stream one multipart field into storage and register it.
async fn store_field(
    state: &AppState,
    session_id: Uuid,
    field: Field<'_>,
) -> Result<FileMetadata, AppError> {
    let filename = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput("Filename is required".to_string()))?;
    state.validator.validate_upload(&filename)?;

    let content_type = field
        .content_type()
        .filter(|ct| !ct.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();

    let declared_size = field
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(size) = declared_size {
        state.validator.validate_size(size)?;
    }

    let file_id = Uuid::new_v4();
    let reader = StreamReader::new(field.map_err(std::io::Error::other));
    let source = UploadSource {
        filename: filename.clone(),
        content_type: content_type.clone(),
        total_bytes: declared_size,
        reader: Box::pin(reader),
    };

    let blob = state
        .transfer
        .upload(session_id, file_id, source, Some(progress_logger(file_id)))
        .await?;

    if let Err(e) = state.validator.validate_size(blob.size) {
        discard_blob(state, &blob).await;
        return Err(e);
    }

    let uploaded = NewFileMetadata {
        id: Some(file_id),
        session_id,
        name: filename,
        size: blob.size,
        content_type,
        storage_path: blob.storage_path.clone(),
        download_url: blob.download_url.clone(),
        uploaded_at: Utc::now(),
    };

    match state.registry.add_metadata(uploaded).await {
        Ok(file) => Ok(file),
        Err(e) => {
            discard_blob(state, &blob).await;
            Err(e)
        }
    }
}

/// Remove a blob that will never be registered. A failed delete orphans the blob;
/// the caller still returns its original error.
async fn discard_blob(state: &AppState, blob: &UploadedBlob) {
    if let Err(cleanup_err) = state.transfer.delete(&blob.storage_path).await {
        tracing::warn!(
            error = %cleanup_err,
            storage_path = %blob.storage_path,
            "Failed to clean up unregistered blob"
        );
    }
}

fn progress_logger(file_id: Uuid) -> ProgressCallback {
    let next_log = Arc::new(AtomicU64::new(PROGRESS_LOG_STEP));
    Arc::new(move |p: UploadProgress| {
        let threshold = next_log.load(Ordering::Relaxed);
        if p.is_complete() {
            tracing::debug!(file_id = %file_id, bytes = p.bytes_transferred, "Upload complete");
        } else if p.bytes_transferred >= threshold {
            next_log.store(
                p.bytes_transferred - p.bytes_transferred % PROGRESS_LOG_STEP + PROGRESS_LOG_STEP,
                Ordering::Relaxed,
            );
            tracing::debug!(
                file_id = %file_id,
                bytes = p.bytes_transferred,
                total_bytes = ?p.total_bytes,
                progress = ?p.progress,
                "Upload in progress"
            );
        }
    })
}

#[utoipa::path(
    get,
    path = "/api/v0/sessions/{id}/files",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Files of the session, newest first", body = Vec<FileMetadata>),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(session_id = %session_id, operation = "list_files"))]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<FileMetadata>>, HttpAppError> {
    let files = state.registry.list_by_session(session_id).await?;
    Ok(Json(files))
}

#[utoipa::path(
    delete,
    path = "/api/v0/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted, or already absent"),
        (status = 500, description = "Blob deletion failed", body = ErrorResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(file_id = %id, operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    if let Some(file) = state.registry.get(id).await? {
        state.transfer.delete(&file.storage_path).await?;
        state.registry.delete_metadata(id).await?;
        tracing::info!(session_id = %file.session_id, "File deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}
