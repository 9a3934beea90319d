use async_trait::async_trait;
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error::StoreError;
use super::model::{Job, JobKind, JobStatus, NewJob, TerminalState};
use super::repository::JobStore;

/// Process-local `JobStore`. All mutations run under one mutex, so the status
/// check and the write of a transition cannot interleave.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
    terminal_writes: AtomicUsize,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of terminal transitions actually applied.
    pub fn terminal_writes(&self) -> usize {
        self.terminal_writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: NewJob) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.lock().await;

        if let Some(key) = &job.idempotency_key {
            let taken = jobs
                .values()
                .any(|j| j.project_id == job.project_id && j.idempotency_key.as_deref() == Some(key));
            if taken {
                return Err(StoreError::Duplicate(key.clone()));
            }
        }

        let now = OffsetDateTime::now_utc();
        let created = Job {
            id: Uuid::new_v4(),
            project_id: job.project_id,
            kind: job.provider.kind(),
            provider: job.provider,
            input_params: Json(job.params),
            idempotency_key: job.idempotency_key,
            external_id: None,
            status: JobStatus::Pending,
            result_payload: None,
            error_info: None,
            cost_cents: job.cost_cents,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        jobs.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.jobs.lock().await.get(&id).cloned())
    }

    async fn find_by_idempotency_key(&self, project_id: Uuid, key: &str) -> Result<Option<Job>, StoreError> {
        let jobs = self.jobs.lock().await;
        Ok(jobs
            .values()
            .find(|j| j.project_id == project_id && j.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn mark_processing(&self, id: Uuid, external_id: &str) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if job.status != JobStatus::Pending {
            return Err(StoreError::InvalidTransition {
                id,
                from: job.status.to_string(),
            });
        }

        job.status = JobStatus::Processing;
        job.external_id = Some(external_id.to_string());
        job.updated_at = OffsetDateTime::now_utc();
        Ok(job.clone())
    }

    async fn update_terminal(
        &self,
        id: Uuid,
        terminal: TerminalState,
        external_id: Option<&str>,
    ) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if job.status.is_terminal() {
            return Err(StoreError::InvalidTransition {
                id,
                from: job.status.to_string(),
            });
        }

        let now = OffsetDateTime::now_utc();
        job.status = terminal.status();
        match terminal {
            TerminalState::Completed(payload) => job.result_payload = Some(Json(payload)),
            TerminalState::Failed(reason) => job.error_info = Some(reason),
        }
        if job.external_id.is_none() {
            job.external_id = external_id.map(str::to_string);
        }
        job.completed_at = Some(now);
        job.updated_at = now;

        self.terminal_writes.fetch_add(1, Ordering::SeqCst);
        Ok(job.clone())
    }

    async fn list_by_parent(&self, project_id: Uuid, kind: Option<JobKind>) -> Result<Vec<Job>, StoreError> {
        let jobs = self.jobs.lock().await;
        let mut listed: Vec<Job> = jobs
            .values()
            .filter(|j| j.project_id == project_id)
            .filter(|j| kind.is_none_or(|k| j.kind == k))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }
}
