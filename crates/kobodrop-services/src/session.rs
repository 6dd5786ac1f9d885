//! Session Store
//!
//! Creates pairing sessions and resolves them by id or code. Resolution extends
//! an expired session instead of rejecting it: a device that comes back after the
//! expiry date still finds its files.

use std::sync::Arc;

use chrono::{Duration, Utc};
use kobodrop_core::models::{NewSession, Session};
use kobodrop_core::{generate_code, AppError};
use kobodrop_db::SessionRepository;
use uuid::Uuid;

type CodeSource = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct SessionStore {
    repository: Arc<dyn SessionRepository>,
    ttl: Duration,
    max_code_attempts: u32,
    code_source: CodeSource,
}

impl SessionStore {
    pub fn new(repository: Arc<dyn SessionRepository>, ttl: Duration, max_code_attempts: u32) -> Self {
        Self {
            repository,
            ttl,
            max_code_attempts: max_code_attempts.max(1),
            code_source: Arc::new(generate_code),
        }
    }

    /// Replace the code generator, e.g. with a scripted sequence in tests.
    pub fn with_code_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.code_source = Arc::new(source);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a session under a code no resolvable session currently uses.
    ///
    /// The uniqueness check and the insert are separate store calls, so two
    /// concurrent creates can still pick the same code.
    #[tracing::instrument(skip(self), fields(operation = "create_session"))]
    pub async fn create(&self) -> Result<Session, AppError> {
        for attempt in 1..=self.max_code_attempts {
            let code = (self.code_source)();

            let existing = self
                .repository
                .find_by_code(&code)
                .await
                .map_err(into_store_failure)?;
            if existing.is_some() {
                tracing::debug!(attempt, "Pairing code collision, generating another");
                continue;
            }

            let session = self
                .repository
                .insert(NewSession::starting_at(code, Utc::now(), self.ttl))
                .await
                .map_err(into_store_failure)?;

            tracing::info!(
                session_id = %session.id,
                expires_at = %session.expires_at,
                attempts = attempt,
                "Session created"
            );
            return Ok(session);
        }

        tracing::error!(
            attempts = self.max_code_attempts,
            "Every generated pairing code collided"
        );
        Err(AppError::TransientStore(format!(
            "No free pairing code after {} attempts",
            self.max_code_attempts
        )))
    }

    #[tracing::instrument(skip(self), fields(operation = "get_session", session_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Session>, AppError> {
        let session = self
            .repository
            .get(id)
            .await
            .map_err(into_store_failure)?;

        match session {
            Some(session) => Ok(Some(self.extend_if_expired(session).await)),
            None => Ok(None),
        }
    }

    /// Look up a session by code. Matching is exact after uppercasing.
    #[tracing::instrument(skip(self, code), fields(operation = "get_session_by_code"))]
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Session>, AppError> {
        let code = code.to_uppercase();
        let session = self
            .repository
            .find_by_code(&code)
            .await
            .map_err(into_store_failure)?;

        match session {
            Some(session) => Ok(Some(self.extend_if_expired(session).await)),
            None => Ok(None),
        }
    }

    /// Push an expired session's expiry to `now + ttl`.
    ///
    /// A failed write is logged and the session is returned unchanged.
    async fn extend_if_expired(&self, mut session: Session) -> Session {
        let now = Utc::now();
        if !session.is_expired_at(now) {
            return session;
        }

        let new_expiry = now + self.ttl;
        match self
            .repository
            .update_expires_at(session.id, new_expiry)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    session_id = %session.id,
                    previous_expiry = %session.expires_at,
                    expires_at = %new_expiry,
                    "Extended expired session"
                );
                session.expires_at = new_expiry;
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session.id,
                    error = %e,
                    "Failed to extend expired session, returning it unchanged"
                );
            }
        }
        session
    }
}

pub(crate) fn into_store_failure(err: AppError) -> AppError {
    match err {
        AppError::Database(source) => AppError::TransientStore(source.to_string()),
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use kobodrop_core::CODE_LENGTH;
    use kobodrop_db::MemorySessionRepository;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Memory repository with switchable failures and a lookup counter.
    #[derive(Default)]
    pub(crate) struct FlakySessionRepository {
        pub inner: MemorySessionRepository,
        pub fail_updates: AtomicBool,
        pub fail_reads: AtomicBool,
        pub lookups: AtomicUsize,
    }

    #[async_trait]
    impl SessionRepository for FlakySessionRepository {
        async fn insert(&self, session: NewSession) -> Result<Session, AppError> {
            self.inner.insert(session).await
        }

        async fn get(&self, id: Uuid) -> Result<Option<Session>, AppError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(AppError::TransientStore("read timed out".to_string()));
            }
            self.inner.get(id).await
        }

        async fn find_by_code(&self, code: &str) -> Result<Option<Session>, AppError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(AppError::TransientStore("read timed out".to_string()));
            }
            self.inner.find_by_code(code).await
        }

        async fn update_expires_at(
            &self,
            id: Uuid,
            expires_at: DateTime<Utc>,
        ) -> Result<(), AppError> {
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(AppError::TransientStore("write rejected".to_string()));
            }
            self.inner.update_expires_at(id, expires_at).await
        }

        async fn ping(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn scripted(codes: &[&str]) -> impl Fn() -> String + Send + Sync + 'static {
        let queue = Mutex::new(codes.iter().map(|c| c.to_string()).collect::<VecDeque<_>>());
        move || {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "ZZZZZZ".to_string())
        }
    }

    fn expired_session(code: &str) -> Session {
        let created = Utc::now() - Duration::days(120);
        Session {
            id: Uuid::new_v4(),
            code: code.to_string(),
            created_at: created,
            expires_at: created + Duration::days(90),
        }
    }

    #[tokio::test]
    async fn create_sets_ninety_day_expiry() {
        let repo = Arc::new(MemorySessionRepository::new());
        let store = SessionStore::new(repo.clone(), Duration::days(90), 16);

        let session = store.create().await.unwrap();
        assert_eq!(session.code.len(), CODE_LENGTH);
        assert_eq!(session.expires_at - session.created_at, Duration::days(90));
        assert_eq!(repo.get(session.id).await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn consecutive_creates_yield_distinct_codes() {
        let repo = Arc::new(MemorySessionRepository::new());
        let store = SessionStore::new(repo, Duration::days(90), 16);

        let a = store.create().await.unwrap();
        let b = store.create().await.unwrap();
        assert_ne!(a.code, b.code);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn create_retries_after_collision() {
        let repo = Arc::new(FlakySessionRepository::default());
        repo.inner.put(expired_session("AAAAAA")).await;
        repo.inner.put(expired_session("BBBBBB")).await;

        let store = SessionStore::new(repo.clone(), Duration::days(90), 16)
            .with_code_source(scripted(&["AAAAAA", "BBBBBB", "CCCCCC"]));

        let session = store.create().await.unwrap();
        assert_eq!(session.code, "CCCCCC");
        assert_eq!(repo.lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn create_gives_up_after_attempt_cap() {
        let repo = Arc::new(MemorySessionRepository::new());
        repo.put(expired_session("AAAAAA")).await;

        let store = SessionStore::new(repo.clone(), Duration::days(90), 4)
            .with_code_source(|| "AAAAAA".to_string());

        let result = store.create().await;
        assert!(matches!(result, Err(AppError::TransientStore(_))));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn get_by_id_extends_expired_session() {
        let repo = Arc::new(MemorySessionRepository::new());
        let expired = expired_session("QWE234");
        repo.put(expired.clone()).await;
        let store = SessionStore::new(repo.clone(), Duration::days(90), 16);

        let before = Utc::now();
        let resolved = store.get_by_id(expired.id).await.unwrap().unwrap();
        assert!(resolved.expires_at >= before + Duration::days(90));

        let persisted = repo.get(expired.id).await.unwrap().unwrap();
        assert_eq!(persisted.expires_at, resolved.expires_at);
    }

    #[tokio::test]
    async fn get_by_code_uppercases_and_extends() {
        let repo = Arc::new(MemorySessionRepository::new());
        let expired = expired_session("QWE234");
        repo.put(expired.clone()).await;
        let store = SessionStore::new(repo.clone(), Duration::days(90), 16);

        let resolved = store.get_by_code("qwe234").await.unwrap().unwrap();
        assert_eq!(resolved.id, expired.id);
        assert!(resolved.expires_at > Utc::now());
        assert_eq!(
            repo.get(expired.id).await.unwrap().unwrap().expires_at,
            resolved.expires_at
        );
    }

    #[tokio::test]
    async fn live_session_is_not_rewritten() {
        let repo = Arc::new(MemorySessionRepository::new());
        let store = SessionStore::new(repo.clone(), Duration::days(90), 16);
        let session = store.create().await.unwrap();

        let resolved = store.get_by_id(session.id).await.unwrap().unwrap();
        assert_eq!(resolved.expires_at, session.expires_at);
    }

    #[tokio::test]
    async fn failed_extension_returns_stale_session() {
        let repo = Arc::new(FlakySessionRepository::default());
        let expired = expired_session("QWE234");
        repo.inner.put(expired.clone()).await;
        repo.fail_updates.store(true, Ordering::SeqCst);
        let store = SessionStore::new(repo.clone(), Duration::days(90), 16);

        let resolved = store.get_by_id(expired.id).await.unwrap().unwrap();
        assert_eq!(resolved.expires_at, expired.expires_at);

        let by_code = store.get_by_code("QWE234").await.unwrap().unwrap();
        assert_eq!(by_code.expires_at, expired.expires_at);
    }

    #[tokio::test]
    async fn unknown_session_is_none() {
        let repo = Arc::new(MemorySessionRepository::new());
        let store = SessionStore::new(repo, Duration::days(90), 16);
        assert!(store.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.get_by_code("NOPE22").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_failure_is_transient_store_error() {
        let repo = Arc::new(FlakySessionRepository::default());
        repo.fail_reads.store(true, Ordering::SeqCst);
        let store = SessionStore::new(repo, Duration::days(90), 16);

        assert!(matches!(
            store.get_by_code("ABC234").await,
            Err(AppError::TransientStore(_))
        ));
        assert!(matches!(
            store.create().await,
            Err(AppError::TransientStore(_))
        ));
    }
}
