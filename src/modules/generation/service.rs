use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::error::{JobError, ProviderError, StoreError};
use super::guard::{AccessGuard, CredentialSource};
use super::model::{Job, JobKind, JobParams, NewJob, Provider, TerminalState};
use super::provider::{AdapterRegistry, PollRequest, ProviderAdapter, ProviderStatus, SubmitOutcome, SubmitRequest};
use super::repository::JobStore;
use crate::common::response::validation_message;
use crate::config::settings::ProviderConfig;

/// Ceiling on poll attempts per request, whatever the configuration says.
pub const MAX_POLL_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Upper bound on every single adapter call.
    pub timeout: Duration,
    /// Poll attempts per request when the provider is unavailable.
    pub poll_attempts: u32,
    pub retry_base: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_attempts: 2,
            retry_base: Duration::from_millis(250),
        }
    }
}

impl From<&ProviderConfig> for OrchestratorSettings {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            timeout: config.timeout(),
            poll_attempts: config.poll_attempts.clamp(1, MAX_POLL_ATTEMPTS),
            retry_base: config.retry_base(),
        }
    }
}

// Publishing jobs need the user's token at submission and on every poll.
#[derive(Debug, Clone, Copy)]
enum TokenUse {
    Publish,
    Poll,
}

#[derive(Debug, Clone)]
pub struct SubmitJob {
    pub provider: Provider,
    pub params: JobParams,
    pub idempotency_key: Option<String>,
}

/// Submit / poll / reconcile state machine shared by every provider.
pub struct JobOrchestrator {
    store: Arc<dyn JobStore>,
    guard: AccessGuard,
    registry: AdapterRegistry,
    credentials: Arc<dyn CredentialSource>,
    settings: OrchestratorSettings,
}

impl JobOrchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        guard: AccessGuard,
        registry: AdapterRegistry,
        credentials: Arc<dyn CredentialSource>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            guard,
            registry,
            credentials,
            settings,
        }
    }

    pub fn enabled_providers(&self) -> Vec<Provider> {
        self.registry.providers()
    }

    #[instrument(skip(self, request), fields(provider = %request.provider))]
    pub async fn submit_job(&self, user_id: Uuid, project_id: Uuid, request: SubmitJob) -> Result<Job, JobError> {
        self.guard.assert_ownership(user_id, project_id).await?;

        let provider = request.provider;
        if !provider.accepts(&request.params) {
            return Err(JobError::InvalidInput(format!(
                "Provider {} does not accept {} parameters",
                provider,
                request.params.kind()
            )));
        }
        request
            .params
            .validate()
            .map_err(|e| JobError::InvalidInput(validation_message(&e)))?;

        let adapter = self
            .registry
            .get(provider)
            .ok_or_else(|| JobError::InvalidInput(format!("Provider {} is not enabled", provider)))?;

        if let Some(key) = request.idempotency_key.as_deref() {
            if key.trim().is_empty() {
                return Err(JobError::InvalidInput("Idempotency key must not be blank".to_string()));
            }
            if let Some(existing) = self.store.find_by_idempotency_key(project_id, key).await? {
                info!(job_id = %existing.id, "idempotent resubmission, returning existing job");
                return same_request(existing, &request);
            }
        }

        let access_token = self.resolve_token(user_id, provider, TokenUse::Publish).await?;

        let new_job = NewJob {
            project_id,
            provider,
            params: request.params.clone(),
            idempotency_key: request.idempotency_key.clone(),
            cost_cents: provider.cost_cents(),
        };

        let job = match self.store.create(new_job).await {
            Ok(job) => job,
            // A concurrent submission with the same key got there first.
            Err(StoreError::Duplicate(_)) if request.idempotency_key.is_some() => {
                let key = request.idempotency_key.as_deref().unwrap_or_default();
                let winner = self
                    .store
                    .find_by_idempotency_key(project_id, key)
                    .await?
                    .ok_or_else(|| JobError::Store(format!("Job for idempotency key {} vanished", key)))?;
                info!(job_id = %winner.id, "lost idempotency race, returning winning job");
                return same_request(winner, &request);
            }
            Err(e) => return Err(e.into()),
        };
        info!(job_id = %job.id, cost_cents = job.cost_cents, "job persisted as pending");

        let submit = SubmitRequest {
            job_id: job.id,
            params: job.params(),
            access_token,
        };

        let budget = adapter.submit_timeout().unwrap_or(self.settings.timeout);
        match bounded(budget, adapter.submit(&submit)).await {
            Ok(SubmitOutcome {
                external_id: Some(external_id),
                status: ProviderStatus::Processing,
            }) => {
                let job = self.store.mark_processing(job.id, &external_id).await?;
                info!(job_id = %job.id, %external_id, "provider accepted job");
                Ok(job)
            }
            Ok(SubmitOutcome {
                external_id: None,
                status: ProviderStatus::Processing,
            }) => {
                warn!(job_id = %job.id, "provider accepted job without an id");
                self.finalize(
                    job.id,
                    TerminalState::Failed("Provider did not return a job id".to_string()),
                    None,
                )
                .await
            }
            Ok(SubmitOutcome {
                external_id,
                status: ProviderStatus::Completed(payload),
            }) => {
                self.finalize(job.id, TerminalState::Completed(payload), external_id.as_deref())
                    .await
            }
            Ok(SubmitOutcome {
                external_id,
                status: ProviderStatus::Failed(reason),
            }) => {
                warn!(job_id = %job.id, %reason, "provider refused job");
                self.finalize(job.id, TerminalState::Failed(reason), external_id.as_deref())
                    .await
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "provider submit failed");
                self.finalize(job.id, TerminalState::Failed(e.to_string()), None)
                    .await?;
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn poll_job(&self, user_id: Uuid, job_id: Uuid) -> Result<Job, JobError> {
        let job = self
            .store
            .get(job_id)
            .await?
            .ok_or_else(|| JobError::NotFound(format!("Job {} not found", job_id)))?;

        self.guard.assert_ownership(user_id, job.project_id).await?;

        if job.status.is_terminal() {
            return Ok(job);
        }

        // Still pending: the submission has not been acknowledged yet.
        let Some(external_id) = job.external_id.clone() else {
            return Ok(job);
        };

        let adapter = self.registry.get(job.provider).ok_or_else(|| {
            JobError::ProviderUnavailable(format!("Provider {} is not enabled", job.provider))
        })?;
        let access_token = self.resolve_token(user_id, job.provider, TokenUse::Poll).await?;

        let status = self
            .poll_with_retry(adapter.as_ref(), &external_id, access_token)
            .await
            .inspect_err(|e| warn!(job_id = %job.id, error = %e, "provider poll failed"))?;

        match status {
            ProviderStatus::Processing => Ok(job),
            ProviderStatus::Completed(payload) => {
                self.finalize(job.id, TerminalState::Completed(payload), None).await
            }
            ProviderStatus::Failed(reason) => self.finalize(job.id, TerminalState::Failed(reason), None).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_jobs_for_parent(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        kind: Option<JobKind>,
    ) -> Result<Vec<Job>, JobError> {
        self.guard.assert_ownership(user_id, project_id).await?;
        Ok(self.store.list_by_parent(project_id, kind).await?)
    }

    /// Applies a terminal state. Losing the race to another caller is not an
    /// error: the already stored terminal record is returned instead.
    async fn finalize(
        &self,
        job_id: Uuid,
        terminal: TerminalState,
        external_id: Option<&str>,
    ) -> Result<Job, JobError> {
        let status = terminal.status();
        match self.store.update_terminal(job_id, terminal, external_id).await {
            Ok(job) => {
                info!(%job_id, %status, "job reached terminal state");
                Ok(job)
            }
            Err(StoreError::InvalidTransition { from, .. }) => {
                info!(%job_id, %from, "job already finalized by another caller");
                self.store
                    .get(job_id)
                    .await?
                    .ok_or_else(|| JobError::NotFound(format!("Job {} not found", job_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_token(
        &self,
        user_id: Uuid,
        provider: Provider,
        purpose: TokenUse,
    ) -> Result<Option<String>, JobError> {
        if !provider.requires_user_token() {
            return Ok(None);
        }

        let token = self
            .credentials
            .access_token(user_id, provider)
            .await
            .map_err(|e| JobError::Store(e.to_string()))?;

        token.map(Some).ok_or_else(|| {
            JobError::InvalidInput(match purpose {
                TokenUse::Publish => format!("Connect your {} account before publishing", provider),
                TokenUse::Poll => format!(
                    "Your {} connection expired or was removed; reconnect it to check this publication",
                    provider
                ),
            })
        })
    }

    async fn poll_with_retry(
        &self,
        adapter: &dyn ProviderAdapter,
        external_id: &str,
        access_token: Option<String>,
    ) -> Result<ProviderStatus, ProviderError> {
        let attempts = self.settings.poll_attempts.clamp(1, MAX_POLL_ATTEMPTS);
        let mut attempt = 1;

        loop {
            let request = PollRequest {
                external_id,
                access_token: access_token.clone(),
            };
            match bounded(self.settings.timeout, adapter.poll(&request)).await {
                Err(ProviderError::Unavailable(reason)) if attempt < attempts => {
                    let delay = backoff_delay(self.settings.retry_base, self.settings.timeout, attempt);
                    warn!(attempt, ?delay, %reason, "provider unavailable, retrying poll");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// An idempotency key replays only the request it was first used with.
fn same_request(existing: Job, request: &SubmitJob) -> Result<Job, JobError> {
    if existing.provider != request.provider || *existing.params() != request.params {
        return Err(JobError::InvalidInput(
            "Idempotency key was already used for a different request".to_string(),
        ));
    }
    Ok(existing)
}

/// Exponential from `base`, never longer than `cap`.
fn backoff_delay(base: Duration, cap: Duration, attempt: u32) -> Duration {
    base.checked_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        .unwrap_or(cap)
        .min(cap)
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Unavailable(format!(
            "timed out after {}ms",
            limit.as_millis()
        ))),
    }
}
