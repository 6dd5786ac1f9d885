use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kobodrop_core::models::{NewSession, Session};
use kobodrop_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::traits::SessionRepository;

#[derive(Clone)]
pub struct SessionRepositoryPg {
    pool: PgPool,
}

impl SessionRepositoryPg {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    code: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            code: row.code,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl SessionRepository for SessionRepositoryPg {
    #[tracing::instrument(skip(self, session), fields(db.table = "sessions", db.operation = "insert"))]
    async fn insert(&self, session: NewSession) -> Result<Session, AppError> {
        let row = sqlx::query_as::<Postgres, SessionRow>(
            r#"
            INSERT INTO sessions (id, code, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, created_at, expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&session.code)
        .bind(session.created_at)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Session>, AppError> {
        let row = sqlx::query_as::<Postgres, SessionRow>(
            "SELECT id, code, created_at, expires_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Session::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "select"))]
    async fn find_by_code(&self, code: &str) -> Result<Option<Session>, AppError> {
        let row = sqlx::query_as::<Postgres, SessionRow>(
            r#"
            SELECT id, code, created_at, expires_at
            FROM sessions
            WHERE code = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Session::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "update", db.record_id = %id))]
    async fn update_expires_at(
        &self,
        id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET expires_at = $1 WHERE id = $2")
            .bind(expires_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
