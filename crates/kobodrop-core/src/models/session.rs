use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A pairing session. Files are grouped under its `id`; devices find it by `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: Uuid,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Session fields supplied on insert; the record store assigns the id.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewSession {
    pub fn starting_at(code: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            code,
            created_at: now,
            expires_at: now + ttl,
        }
    }
}

/// Session as returned to the uploading browser
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    /// Canonical 6-character pairing code
    pub code: String,
    /// Code split for display, e.g. `ABC-123`
    pub display_code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        let display_code = crate::pairing::group_for_display(&session.code);
        Self {
            id: session.id,
            code: session.code,
            display_code,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}
