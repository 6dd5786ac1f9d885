//! Test helpers: build AppState and router for integration tests.
//!
//! The app runs over the in-memory repositories and local storage in a temporary
//! directory, so these tests need neither Docker nor network access.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use kobodrop_api::constants;
use kobodrop_api::setup::routes;
use kobodrop_api::{AppState, Repositories};
use kobodrop_core::models::{FileMetadata, SessionResponse};
use kobodrop_core::Config;
use kobodrop_db::{FileRepository, MemoryFileRepository, MemorySessionRepository};
use kobodrop_services::StorageBlobFetcher;
use kobodrop_storage::{LocalStorage, Storage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub sessions: Arc<MemorySessionRepository>,
    pub files: Arc<MemoryFileRepository>,
    pub storage: Arc<dyn Storage>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Setup test app with default limits.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

/// Setup test app with extra configuration variables, e.g. a lower `PROXY_MAX_BYTES`.
pub async fn setup_test_app_with(vars: &[(&str, &str)]) -> TestApp {
    build_test_app(vars, None).await
}

/// Setup test app whose file registry writes to `files` instead of the memory
/// repository exposed as `TestApp::files`.
pub async fn setup_test_app_with_file_repository(files: Arc<dyn FileRepository>) -> TestApp {
    build_test_app(&[], Some(files)).await
}

async fn build_test_app(
    vars: &[(&str, &str)],
    file_repository: Option<Arc<dyn FileRepository>>,
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_path = temp_dir.path().to_string_lossy().to_string();

    let mut env: HashMap<String, String> = HashMap::from([
        ("LOCAL_STORAGE_PATH".to_string(), storage_path.clone()),
        (
            "LOCAL_STORAGE_BASE_URL".to_string(),
            "http://localhost:4000/media".to_string(),
        ),
    ]);
    for (key, value) in vars {
        env.insert(key.to_string(), value.to_string());
    }
    let config = Config::from_lookup(|key| env.get(key).cloned()).expect("Invalid test config");
    config.validate().expect("Invalid test config");

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(&storage_path, "http://localhost:4000/media".to_string())
            .await
            .expect("Failed to create local storage"),
    );

    let sessions = Arc::new(MemorySessionRepository::new());
    let files = Arc::new(MemoryFileRepository::new());
    let repositories = Repositories {
        sessions: sessions.clone(),
        files: file_repository.unwrap_or_else(|| files.clone()),
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        repositories,
        storage.clone(),
        Arc::new(StorageBlobFetcher::new(storage.clone())),
    ));
    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        sessions,
        files,
        storage,
        _temp_dir: temp_dir,
    }
}

pub async fn create_session(client: &TestServer) -> SessionResponse {
    let response = client.post(&api_path("/sessions")).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<SessionResponse>()
}

pub fn file_form(name: &str, content_type: &str, data: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data.to_vec())
            .file_name(name)
            .mime_type(content_type),
    )
}

pub async fn upload(
    client: &TestServer,
    session_id: uuid::Uuid,
    name: &str,
    data: &[u8],
) -> FileMetadata {
    let response = client
        .post(&api_path(&format!("/sessions/{}/files", session_id)))
        .multipart(file_form(name, "application/epub+zip", data))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<FileMetadata>()
}

/// Every file below `dir`, recursively.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .flat_map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                files_under(&path)
            } else {
                vec![path]
            }
        })
        .collect()
}
