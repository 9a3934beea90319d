use serde::Serialize;
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::modules::generation::model::Provider;

/// A user's stored credentials for a publishing platform.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Integration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: Provider,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_at: Option<OffsetDateTime>,
    pub scope: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN: Duration = Duration::seconds(60);

impl Integration {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn needs_refresh(&self, now: OffsetDateTime) -> bool {
        self.is_expired(now + REFRESH_MARGIN)
    }
}

/// Absolute expiry for a lifetime in seconds; `None` when it is not representable.
pub fn expiry_after(now: OffsetDateTime, lifetime_secs: i64) -> Option<OffsetDateTime> {
    now.checked_add(Duration::seconds(lifetime_secs))
}
