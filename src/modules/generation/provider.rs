use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::error::ProviderError;
use super::model::{JobParams, Provider, ResultPayload};

/// Normalized provider-side status of one external job.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderStatus {
    Processing,
    Completed(ResultPayload),
    Failed(String),
}

impl ProviderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProviderStatus::Processing)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub external_id: Option<String>,
    pub status: ProviderStatus,
}

impl SubmitOutcome {
    pub fn accepted(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            status: ProviderStatus::Processing,
        }
    }

    /// Business-level refusal: the job is recorded as failed, nothing is thrown.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            external_id: None,
            status: ProviderStatus::Failed(reason.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmitRequest<'a> {
    pub job_id: Uuid,
    pub params: &'a JobParams,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PollRequest<'a> {
    pub external_id: &'a str,
    pub access_token: Option<String>,
}

/// Per-vendor translation layer. Adapters never touch the job store.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Upper bound for one `submit` call when it moves more than a request
    /// body, such as a video upload. `None` keeps the orchestrator default.
    fn submit_timeout(&self) -> Option<Duration> {
        None
    }

    async fn submit(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError>;

    /// Safe to call repeatedly for the same external id.
    async fn poll(&self, request: &PollRequest<'_>) -> Result<ProviderStatus, ProviderError>;
}

/// Maps each provider tag to the adapter that serves it.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Provider, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) -> &mut Self {
        self.adapters.insert(adapter.provider(), adapter);
        self
    }

    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider).cloned()
    }

    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = self.adapters.keys().copied().collect();
        providers.sort_by_key(|p| p.as_str());
        providers
    }
}
