use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kobodrop_core::models::{NewSession, Session};
use kobodrop_core::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::traits::SessionRepository;

#[derive(Clone, Default)]
pub struct MemorySessionRepository {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed session, bypassing id assignment.
    pub async fn put(&self, session: Session) {
        self.sessions.write().await.insert(session.id, session);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn insert(&self, session: NewSession) -> Result<Session, AppError> {
        let stored = Session {
            id: Uuid::new_v4(),
            code: session.code,
            created_at: session.created_at,
            expires_at: session.expires_at,
        };
        self.sessions
            .write()
            .await
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Session>, AppError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Session>, AppError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.code == code)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn update_expires_at(
        &self,
        id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(session) = self.sessions.write().await.get_mut(&id) {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn find_by_code_prefers_newest() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let older = repo
            .insert(NewSession::starting_at(
                "ABC234".to_string(),
                now - Duration::days(2),
                Duration::days(90),
            ))
            .await
            .unwrap();
        let newer = repo
            .insert(NewSession::starting_at(
                "ABC234".to_string(),
                now,
                Duration::days(90),
            ))
            .await
            .unwrap();

        let found = repo.find_by_code("ABC234").await.unwrap().unwrap();
        assert_eq!(found.id, newer.id);
        assert_ne!(found.id, older.id);
        assert!(repo.find_by_code("abc234").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_expiry_persists() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let session = repo
            .insert(NewSession::starting_at("XYZ789".to_string(), now, Duration::days(1)))
            .await
            .unwrap();

        let later = now + Duration::days(30);
        repo.update_expires_at(session.id, later).await.unwrap();
        assert_eq!(repo.get(session.id).await.unwrap().unwrap().expires_at, later);

        repo.update_expires_at(Uuid::new_v4(), later).await.unwrap();
        assert_eq!(repo.len().await, 1);
    }
}
