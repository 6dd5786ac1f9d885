use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kobodrop_core::models::SessionResponse;
use kobodrop_core::{AppError, PairingCode};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v0/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "create_session"))]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state.sessions.create().await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

#[utoipa::path(
    get,
    path = "/api/v0/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session, extended if it had expired", body = SessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(session_id = %id, operation = "get_session"))]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, HttpAppError> {
    let session = state
        .sessions
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    Ok(Json(SessionResponse::from(session)))
}

#[utoipa::path(
    get,
    path = "/api/v0/sessions/code/{code}",
    tag = "sessions",
    params(
        ("code" = String, Path, description = "Pairing code, with or without the hyphen")
    ),
    responses(
        (status = 200, description = "Session, extended if it had expired", body = SessionResponse),
        (status = 400, description = "Malformed code", body = ErrorResponse),
        (status = 404, description = "Code not found", body = ErrorResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, code), fields(operation = "get_session_by_code"))]
pub async fn get_session_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<SessionResponse>, HttpAppError> {
    let code = PairingCode::parse(&code)?;
    let session = state
        .sessions
        .get_by_code(code.as_str())
        .await?
        .ok_or_else(|| {
            AppError::NotFound(
                "Code not found or expired. Please check the code and try again.".to_string(),
            )
        })?;
    Ok(Json(SessionResponse::from(session)))
}
