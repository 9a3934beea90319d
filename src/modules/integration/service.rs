use super::dto::{ConnectIntegrationRequest, IntegrationResponse};
use super::model::expiry_after;
use super::repository::{IntegrationRepository, UpsertIntegration};
use crate::common::response::{validation_message, ApiError};
use crate::modules::generation::model::{JobKind, Provider};
use crate::state::AppState;
use axum::http::StatusCode;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{0} is not connected")]
    NotConnected(Provider),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<IntegrationError> for ApiError {
    fn from(e: IntegrationError) -> Self {
        match e {
            IntegrationError::NotConnected(_) => ApiError(e.to_string(), StatusCode::NOT_FOUND),
            IntegrationError::Invalid(_) => ApiError(e.to_string(), StatusCode::BAD_REQUEST),
            IntegrationError::Internal(err) => {
                tracing::error!(error = %err, "integration operation failed");
                ApiError::internal("Internal Server Error")
            }
        }
    }
}

pub struct IntegrationService;

impl IntegrationService {
    /// Only publishing platforms take user credentials.
    pub fn parse_platform(raw: &str) -> Result<Provider, ApiError> {
        let platform: Provider = raw.parse().map_err(ApiError::bad_request)?;
        if platform.kind() != JobKind::Publication {
            return Err(ApiError::bad_request(format!(
                "{} is not a publishing platform",
                platform
            )));
        }
        Ok(platform)
    }

    pub async fn list(
        state: AppState,
        user_id: Uuid,
    ) -> Result<Vec<IntegrationResponse>, IntegrationError> {
        let integrations = IntegrationRepository::find_all_by_user(&state.db, user_id).await?;
        Ok(integrations.into_iter().map(IntegrationResponse::from).collect())
    }

    pub async fn connect(
        state: AppState,
        user_id: Uuid,
        platform: Provider,
        req: ConnectIntegrationRequest,
    ) -> Result<IntegrationResponse, IntegrationError> {
        req.validate()
            .map_err(|e| IntegrationError::Invalid(validation_message(&e)))?;

        let expires_at = req
            .expires_in
            .map(|secs| {
                expiry_after(OffsetDateTime::now_utc(), secs)
                    .ok_or_else(|| IntegrationError::Invalid("expiresIn is out of range".into()))
            })
            .transpose()?;

        let integration = IntegrationRepository::upsert(
            &state.db,
            user_id,
            platform,
            UpsertIntegration {
                access_token: &req.access_token,
                refresh_token: req.refresh_token.as_deref(),
                expires_at,
                scope: req.scope.as_deref(),
            },
        )
        .await?;

        tracing::info!(%user_id, %platform, "platform connected");
        Ok(integration.into())
    }

    pub async fn disconnect(
        state: AppState,
        user_id: Uuid,
        platform: Provider,
    ) -> Result<(), IntegrationError> {
        if !IntegrationRepository::delete(&state.db, user_id, platform).await? {
            return Err(IntegrationError::NotConnected(platform));
        }
        tracing::info!(%user_id, %platform, "platform disconnected");
        Ok(())
    }
}
