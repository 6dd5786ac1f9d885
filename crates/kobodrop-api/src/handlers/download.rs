//! `GET /download?id=`: the link the e-reader follows for each file.
//!
//! Errors are short plain-text bodies, since the requester is a browser in the
//! middle of a download rather than an API client.

use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use kobodrop_core::AppError;
use kobodrop_services::{DownloadPlan, ProxiedDownload};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct DownloadQuery {
    /// File ID
    pub id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/download",
    tag = "downloads",
    params(DownloadQuery),
    responses(
        (status = 200, description = "File content with its original filename", content_type = "application/octet-stream"),
        (status = 302, description = "Redirect to the blob URL for files above the proxy limit"),
        (status = 400, description = "Missing file ID", content_type = "text/plain"),
        (status = 404, description = "File not found", content_type = "text/plain"),
        (status = 500, description = "Upstream fetch failed", content_type = "text/plain")
    )
)]
#[tracing::instrument(skip(state, query), fields(operation = "download_file"))]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Response<Body> {
    let raw_id = match query.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => return plain_text(StatusCode::BAD_REQUEST, "Missing file ID"),
    };

    // An id that cannot exist is reported like any other unknown id.
    let Ok(file_id) = Uuid::parse_str(raw_id) else {
        return plain_text(StatusCode::NOT_FOUND, "File not found");
    };

    match state.downloads.dispatch(file_id).await {
        Ok(DownloadPlan::Redirect { url }) => redirect(&url),
        Ok(DownloadPlan::Proxy(download)) => proxy_response(download),
        Err(AppError::NotFound(_)) => plain_text(StatusCode::NOT_FOUND, "File not found"),
        Err(AppError::Transfer(e)) => {
            tracing::error!(file_id = %file_id, error = %e, "Proxied download failed");
            plain_text(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch file from storage",
            )
        }
        Err(e) => {
            tracing::error!(file_id = %file_id, error = %e.detailed_message(), "Download failed");
            plain_text(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Download failed. Please try again.",
            )
        }
    }
}

fn proxy_response(download: ProxiedDownload) -> Response<Body> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.content_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            download.content_disposition.as_str(),
        );
    if let Some(length) = download.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    builder
        .body(Body::from_stream(download.body))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build download response");
            plain_text(StatusCode::INTERNAL_SERVER_ERROR, "Download failed")
        })
}

fn redirect(url: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, url)
        .body(Body::empty())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Invalid redirect location");
            plain_text(StatusCode::INTERNAL_SERVER_ERROR, "Download failed")
        })
}

fn plain_text(status: StatusCode, message: &'static str) -> Response<Body> {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message,
    )
        .into_response()
}
