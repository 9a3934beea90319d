use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::Validate;

use super::model::Integration;
use crate::modules::generation::model::Provider;

/// Longest accepted token lifetime, ten years.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 315_360_000;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectIntegrationRequest {
    #[validate(length(min = 1, message = "Access token is required"))]
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[validate(range(
        min = 1,
        max = MAX_TOKEN_LIFETIME_SECS,
        message = "expiresIn must be between 1 second and 10 years"
    ))]
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

/// Public view of an integration. Tokens never leave the server.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResponse {
    pub platform: Provider,
    pub expired: bool,
    pub scope: Option<String>,
    #[serde(with = "time::serde::iso8601::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::iso8601")]
    #[schema(value_type = String, format = DateTime)]
    pub connected_at: OffsetDateTime,
}

impl From<Integration> for IntegrationResponse {
    fn from(i: Integration) -> Self {
        Self {
            platform: i.platform,
            expired: i.is_expired(OffsetDateTime::now_utc()),
            scope: i.scope,
            expires_at: i.expires_at,
            connected_at: i.created_at,
        }
    }
}
