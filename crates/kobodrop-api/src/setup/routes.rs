//! Route configuration and setup.

use crate::constants::{API_PREFIX, MEDIA_PREFIX};
use crate::handlers::{download, files, health, kobo, sessions};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use kobodrop_core::{Config, StorageBackend};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config);

    let http_concurrency_limit = config.base.http_concurrency_limit;
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let body_limit =
        usize::try_from(config.max_file_size_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
            .unwrap_or(usize::MAX);

    let mut app = api_routes()
        .merge(device_routes())
        .merge(health_routes())
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"));

    if config.storage_backend == StorageBackend::Local {
        if let Some(path) = config.local_storage_path.as_deref() {
            tracing::info!(path = %path, "Serving local storage under {}", MEDIA_PREFIX);
            app = app.nest_service(MEDIA_PREFIX, ServeDir::new(path));
        }
    }

    let app = app
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/sessions", API_PREFIX),
            post(sessions::create_session),
        )
        .route(
            &format!("{}/sessions/code/{{code}}", API_PREFIX),
            get(sessions::get_session_by_code),
        )
        .route(
            &format!("{}/sessions/{{id}}", API_PREFIX),
            get(sessions::get_session),
        )
        .route(
            &format!("{}/sessions/{{id}}/files", API_PREFIX),
            get(files::list_files).post(files::upload_file),
        )
        .route(
            &format!("{}/files/{{id}}", API_PREFIX),
            delete(files::delete_file),
        )
}

/// Routes the e-reader browser visits
fn device_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/kobo", get(kobo::kobo_page).post(kobo::kobo_submit))
        .route("/download", get(download::download_file))
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::liveness_check))
}

fn setup_cors(config: &Config) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins()
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    }
}
