//! OpenAPI documentation, served at `/api/openapi.json` and browsable at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use kobodrop_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kobodrop API",
        version = "0.1.0",
        description = "Send files from a browser to an e-reader. A browser creates a session, uploads files under it and shows the pairing code; the e-reader enters the code at /kobo and downloads the files. JSON endpoints are versioned under /api/v0/."
    ),
    paths(
        // Sessions
        handlers::sessions::create_session,
        handlers::sessions::get_session,
        handlers::sessions::get_session_by_code,
        // Files
        handlers::files::upload_file,
        handlers::files::list_files,
        handlers::files::delete_file,
        // E-reader
        handlers::download::download_file,
        handlers::kobo::kobo_page,
        handlers::kobo::kobo_submit,
        // Health
        handlers::health::health_check,
        handlers::health::liveness_check,
    ),
    components(
        schemas(
            models::SessionResponse,
            models::FileMetadata,
            handlers::health::HealthCheckResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "sessions", description = "Pairing sessions and code lookup"),
        (name = "files", description = "Upload, list and delete the files of a session"),
        (name = "downloads", description = "File downloads for the e-reader"),
        (name = "kobo", description = "HTML pages for the e-reader browser"),
        (name = "health", description = "Liveness and dependency checks")
    )
)]
pub struct ApiDoc;
