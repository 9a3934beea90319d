use super::model::Integration;
use super::refresh::{renew, Renewal, TokenRefresher};
use crate::modules::generation::guard::CredentialSource;
use crate::modules::generation::model::Provider;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

const INTEGRATION_COLUMNS: &str =
    "id, user_id, platform, access_token, refresh_token, expires_at, scope, created_at, updated_at";

pub struct UpsertIntegration<'a> {
    pub access_token: &'a str,
    pub refresh_token: Option<&'a str>,
    pub expires_at: Option<OffsetDateTime>,
    pub scope: Option<&'a str>,
}

pub struct IntegrationRepository;

impl IntegrationRepository {
    pub async fn find_all_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Integration>> {
        let sql = format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations WHERE user_id = $1 ORDER BY platform"
        );
        sqlx::query_as::<_, Integration>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| anyhow!("Failed to fetch integrations: {}", e))
    }

    pub async fn find(pool: &PgPool, user_id: Uuid, platform: Provider) -> Result<Option<Integration>> {
        let sql = format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations WHERE user_id = $1 AND platform = $2"
        );
        sqlx::query_as::<_, Integration>(&sql)
            .bind(user_id)
            .bind(platform)
            .fetch_optional(pool)
            .await
            .map_err(|e| anyhow!("Failed to fetch integration: {}", e))
    }

    /// Reconnecting a platform replaces the stored credentials.
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        platform: Provider,
        data: UpsertIntegration<'_>,
    ) -> Result<Integration> {
        let sql = format!(
            r#"
            INSERT INTO integrations (user_id, platform, access_token, refresh_token, expires_at, scope)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, platform) DO UPDATE
            SET access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                expires_at = EXCLUDED.expires_at,
                scope = EXCLUDED.scope,
                updated_at = NOW()
            RETURNING {INTEGRATION_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Integration>(&sql)
            .bind(user_id)
            .bind(platform)
            .bind(data.access_token)
            .bind(data.refresh_token)
            .bind(data.expires_at)
            .bind(data.scope)
            .fetch_one(pool)
            .await
            .map_err(|e| anyhow!("Failed to save integration: {}", e))
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, platform: Provider) -> Result<bool> {
        let result = sqlx::query("DELETE FROM integrations WHERE user_id = $1 AND platform = $2")
            .bind(user_id)
            .bind(platform)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Hands stored platform tokens to the job orchestrator, refreshing them
/// through the platform's token endpoint once they expire.
#[derive(Clone)]
pub struct PgCredentialSource {
    pool: PgPool,
    refresher: Arc<dyn TokenRefresher>,
}

impl PgCredentialSource {
    pub fn new(pool: PgPool, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self { pool, refresher }
    }
}

#[async_trait]
impl CredentialSource for PgCredentialSource {
    async fn access_token(&self, user_id: Uuid, provider: Provider) -> Result<Option<String>> {
        let Some(integration) = IntegrationRepository::find(&self.pool, user_id, provider).await? else {
            return Ok(None);
        };

        let renewal = renew(self.refresher.as_ref(), &integration, OffsetDateTime::now_utc())
            .await
            .map_err(|e| anyhow!("Failed to refresh {} token: {}", provider, e))?;

        match renewal {
            Renewal::Current(token) => Ok(Some(token)),
            Renewal::Unusable => Ok(None),
            Renewal::Renewed {
                access_token,
                refresh_token,
                expires_at,
            } => {
                IntegrationRepository::upsert(
                    &self.pool,
                    user_id,
                    provider,
                    UpsertIntegration {
                        access_token: &access_token,
                        refresh_token: refresh_token.as_deref(),
                        expires_at,
                        scope: integration.scope.as_deref(),
                    },
                )
                .await?;
                tracing::info!(%user_id, %provider, "platform token refreshed");
                Ok(Some(access_token))
            }
        }
    }
}
