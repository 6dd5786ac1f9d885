//! Pairing lookup behind the e-reader page.
//!
//! Turns a raw `code` parameter into one of the page states the `/kobo` view
//! renders. Store failures never escape as errors; they become
//! [`KoboPage::Unavailable`] so the device always gets a page back.

use kobodrop_core::format::{file_extension_badge, format_file_size};
use kobodrop_core::models::FileMetadata;
use kobodrop_core::pairing::normalize;
use kobodrop_core::{AppError, ErrorMetadata, PairingCode};

use crate::download::{route_for_size, DownloadRoute};
use crate::registry::FileRegistry;
use crate::session::SessionStore;

/// One entry of the file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub id: uuid::Uuid,
    pub name: String,
    /// Uppercased extension, `FILE` without one
    pub badge: String,
    pub size_label: String,
    /// `/download?id=...` on the proxy path, the blob URL otherwise
    pub href: String,
    /// Served by redirect; the device will not see the original filename.
    pub is_large: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KoboPage {
    EntryForm,
    InvalidCode { message: String },
    NotFound { code: PairingCode },
    Files { code: PairingCode, files: Vec<ListedFile> },
    Unavailable,
}

#[derive(Clone)]
pub struct KoboListing {
    sessions: SessionStore,
    registry: FileRegistry,
    proxy_max_bytes: u64,
}

impl KoboListing {
    pub fn new(sessions: SessionStore, registry: FileRegistry, proxy_max_bytes: u64) -> Self {
        Self {
            sessions,
            registry,
            proxy_max_bytes,
        }
    }

    #[tracing::instrument(skip(self, raw_code), fields(operation = "kobo_lookup"))]
    pub async fn lookup(&self, raw_code: Option<&str>) -> KoboPage {
        let raw = raw_code.unwrap_or_default();
        if normalize(raw).is_empty() {
            return KoboPage::EntryForm;
        }

        let code = match PairingCode::parse(raw) {
            Ok(code) => code,
            Err(e) => {
                return KoboPage::InvalidCode {
                    message: e.client_message(),
                }
            }
        };

        match self.files_for(&code).await {
            Ok(Some(files)) => KoboPage::Files { code, files },
            Ok(None) => {
                tracing::debug!("Pairing code not found");
                KoboPage::NotFound { code }
            }
            Err(e) => {
                tracing::error!(error = %e.detailed_message(), "Pairing lookup failed");
                KoboPage::Unavailable
            }
        }
    }

    async fn files_for(&self, code: &PairingCode) -> Result<Option<Vec<ListedFile>>, AppError> {
        let Some(session) = self.sessions.get_by_code(code.as_str()).await? else {
            return Ok(None);
        };
        let files = self.registry.list_by_session(session.id).await?;
        Ok(Some(
            files.into_iter().map(|f| self.list_entry(f)).collect(),
        ))
    }

    fn list_entry(&self, file: FileMetadata) -> ListedFile {
        let route = route_for_size(file.size, self.proxy_max_bytes);
        let href = match route {
            DownloadRoute::Proxy => format!("/download?id={}", file.id),
            DownloadRoute::Direct => file.download_url,
        };
        ListedFile {
            id: file.id,
            badge: file_extension_badge(&file.name),
            size_label: format_file_size(file.size),
            href,
            is_large: route == DownloadRoute::Direct,
            name: file.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DEFAULT_PROXY_MAX_BYTES;
    use crate::session::tests::FlakySessionRepository;
    use chrono::{Duration, Utc};
    use kobodrop_core::models::NewFileMetadata;
    use kobodrop_db::{MemoryFileRepository, MemorySessionRepository};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use uuid::Uuid;

    fn listing_over(sessions: SessionStore) -> (KoboListing, FileRegistry) {
        let registry = FileRegistry::new(Arc::new(MemoryFileRepository::new()));
        (
            KoboListing::new(sessions, registry.clone(), DEFAULT_PROXY_MAX_BYTES),
            registry,
        )
    }

    fn upload(session_id: Uuid, name: &str, size: u64, age_minutes: i64) -> NewFileMetadata {
        NewFileMetadata {
            id: None,
            session_id,
            name: name.to_string(),
            size,
            content_type: "application/octet-stream".to_string(),
            storage_path: format!("uploads/{}/f/{}", session_id, name),
            download_url: format!("https://cdn.example/{}", name),
            uploaded_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn blank_input_shows_entry_form() {
        let store = SessionStore::new(Arc::new(MemorySessionRepository::new()), Duration::days(90), 16);
        let (listing, _) = listing_over(store);

        assert_eq!(listing.lookup(None).await, KoboPage::EntryForm);
        assert_eq!(listing.lookup(Some("")).await, KoboPage::EntryForm);
        assert_eq!(listing.lookup(Some(" - ")).await, KoboPage::EntryForm);
    }

    #[tokio::test]
    async fn malformed_code_is_rejected() {
        let store = SessionStore::new(Arc::new(MemorySessionRepository::new()), Duration::days(90), 16);
        let (listing, _) = listing_over(store);

        let page = listing.lookup(Some("AB-12")).await;
        let KoboPage::InvalidCode { message } = page else {
            panic!("expected invalid code, got {:?}", page);
        };
        assert!(message.contains("6-character code"));
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let store = SessionStore::new(Arc::new(MemorySessionRepository::new()), Duration::days(90), 16);
        let (listing, _) = listing_over(store);

        assert_eq!(
            listing.lookup(Some("abc-234")).await,
            KoboPage::NotFound {
                code: PairingCode::parse("ABC234").unwrap()
            }
        );
    }

    #[tokio::test]
    async fn lists_files_newest_first_with_routes() {
        let store = SessionStore::new(Arc::new(MemorySessionRepository::new()), Duration::days(90), 16);
        let session = store.create().await.unwrap();
        let (listing, registry) = listing_over(store);

        let small = registry
            .add_metadata(upload(session.id, "Small Book.epub", 40 * 1024 * 1024, 10))
            .await
            .unwrap();
        registry
            .add_metadata(upload(session.id, "comic.cbz", 60 * 1024 * 1024, 0))
            .await
            .unwrap();
        registry
            .add_metadata(upload(Uuid::new_v4(), "other.pdf", 10, 0))
            .await
            .unwrap();

        let typed = session.code.to_lowercase();
        let KoboPage::Files { code, files } = listing.lookup(Some(typed.as_str())).await else {
            panic!("expected file list");
        };
        assert_eq!(code.as_str(), session.code);
        assert_eq!(files.len(), 2);

        assert_eq!(files[0].name, "comic.cbz");
        assert_eq!(files[0].badge, "CBZ");
        assert_eq!(files[0].size_label, "60 MB");
        assert!(files[0].is_large);
        assert_eq!(files[0].href, "https://cdn.example/comic.cbz");

        assert_eq!(files[1].id, small.id);
        assert_eq!(files[1].badge, "EPUB");
        assert!(!files[1].is_large);
        assert_eq!(files[1].href, format!("/download?id={}", small.id));
    }

    #[tokio::test]
    async fn session_without_files_lists_nothing() {
        let store = SessionStore::new(Arc::new(MemorySessionRepository::new()), Duration::days(90), 16);
        let session = store.create().await.unwrap();
        let (listing, _) = listing_over(store);

        let page = listing.lookup(Some(session.code.as_str())).await;
        assert!(matches!(page, KoboPage::Files { ref files, .. } if files.is_empty()));
    }

    #[tokio::test]
    async fn store_failure_is_unavailable() {
        let repo = Arc::new(FlakySessionRepository::default());
        repo.fail_reads.store(true, Ordering::SeqCst);
        let store = SessionStore::new(repo, Duration::days(90), 16);
        let (listing, _) = listing_over(store);

        assert_eq!(listing.lookup(Some("ABC234")).await, KoboPage::Unavailable);
    }
}
