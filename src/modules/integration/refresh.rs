use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::warn;

use super::dto::MAX_TOKEN_LIFETIME_SECS;
use super::model::{expiry_after, Integration};
use crate::modules::generation::error::ProviderError;
use crate::modules::generation::model::Provider;

/// A fresh access token handed back by a platform's token endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshedToken {
    pub access_token: String,
    /// Some platforms rotate the refresh token on every use.
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// Exchanges a stored refresh token for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, platform: Provider, refresh_token: &str) -> Result<RefreshedToken, ProviderError>;
}

/// What to do with a stored integration before handing out its token.
#[derive(Debug, Clone, PartialEq)]
pub enum Renewal {
    Current(String),
    Renewed {
        access_token: String,
        refresh_token: Option<String>,
        expires_at: Option<OffsetDateTime>,
    },
    Unusable,
}

/// Refreshes a token that is expired or about to expire. A token that is
/// still valid is kept when the refresh fails; an expired one is only
/// reported as an error when the platform was unreachable.
pub async fn renew(
    refresher: &dyn TokenRefresher,
    integration: &Integration,
    now: OffsetDateTime,
) -> Result<Renewal, ProviderError> {
    if !integration.needs_refresh(now) {
        return Ok(Renewal::Current(integration.access_token.clone()));
    }

    let still_valid = !integration.is_expired(now);
    let Some(refresh_token) = integration.refresh_token.as_deref() else {
        return Ok(fallback(integration, still_valid));
    };

    match refresher.refresh(integration.platform, refresh_token).await {
        Ok(fresh) => Ok(Renewal::Renewed {
            access_token: fresh.access_token,
            refresh_token: fresh.refresh_token.or_else(|| integration.refresh_token.clone()),
            expires_at: fresh
                .expires_in
                .and_then(|secs| expiry_after(now, secs.clamp(1, MAX_TOKEN_LIFETIME_SECS))),
        }),
        Err(ProviderError::Unavailable(reason)) if !still_valid => {
            Err(ProviderError::Unavailable(reason))
        }
        Err(e) => {
            warn!(user_id = %integration.user_id, platform = %integration.platform, error = %e, "token refresh failed");
            Ok(fallback(integration, still_valid))
        }
    }
}

fn fallback(integration: &Integration, still_valid: bool) -> Renewal {
    if still_valid {
        Renewal::Current(integration.access_token.clone())
    } else {
        Renewal::Unusable
    }
}
