use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::error::JobError;
use super::model::Provider;

/// Resolves the owner of a project.
#[async_trait]
pub trait ProjectOwnership: Send + Sync {
    async fn owner_of(&self, project_id: Uuid) -> anyhow::Result<Option<Uuid>>;
}

/// Supplies a user's stored access token for a publishing platform.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn access_token(&self, user_id: Uuid, provider: Provider) -> anyhow::Result<Option<String>>;
}

#[derive(Clone)]
pub struct AccessGuard {
    projects: Arc<dyn ProjectOwnership>,
}

impl AccessGuard {
    pub fn new(projects: Arc<dyn ProjectOwnership>) -> Self {
        Self { projects }
    }

    /// A missing project and someone else's project both fail with
    /// `NotAuthorized`, so callers cannot enumerate project ids.
    pub async fn assert_ownership(&self, user_id: Uuid, project_id: Uuid) -> Result<(), JobError> {
        let owner = self
            .projects
            .owner_of(project_id)
            .await
            .map_err(|e| JobError::Store(e.to_string()))?;

        match owner {
            Some(owner) if owner == user_id => Ok(()),
            _ => {
                warn!(%user_id, %project_id, "ownership check failed");
                Err(JobError::NotAuthorized)
            }
        }
    }
}
