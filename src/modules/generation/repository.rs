use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::error::StoreError;
use super::model::{Job, JobKind, JobStatus, NewJob, TerminalState};

/// Durable record of submitted jobs.
///
/// `update_terminal` is the only mutation once a job has been submitted and must
/// be atomic: of two concurrent callers at most one applies a terminal state, the
/// other gets `StoreError::InvalidTransition`.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: NewJob) -> Result<Job, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError>;

    async fn find_by_idempotency_key(&self, project_id: Uuid, key: &str) -> Result<Option<Job>, StoreError>;

    /// `pending -> processing`, attaching the provider's job id.
    async fn mark_processing(&self, id: Uuid, external_id: &str) -> Result<Job, StoreError>;

    async fn update_terminal(
        &self,
        id: Uuid,
        terminal: TerminalState,
        external_id: Option<&str>,
    ) -> Result<Job, StoreError>;

    /// Newest first.
    async fn list_by_parent(&self, project_id: Uuid, kind: Option<JobKind>) -> Result<Vec<Job>, StoreError>;
}

const JOB_COLUMNS: &str = "id, project_id, kind, provider, input_params, idempotency_key, external_id, \
     status, result_payload, error_info, cost_cents, created_at, updated_at, completed_at";

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Conditional updates report zero rows both for a missing job and for a
    // forbidden transition; this tells the two apart.
    async fn transition_failure(&self, id: Uuid) -> StoreError {
        match self.get(id).await {
            Ok(Some(job)) => StoreError::InvalidTransition {
                id,
                from: job.status.to_string(),
            },
            Ok(None) => StoreError::NotFound(id),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, job), fields(project_id = %job.project_id, provider = %job.provider))]
    async fn create(&self, job: NewJob) -> Result<Job, StoreError> {
        let kind = job.provider.kind();
        let sql = format!(
            r#"
            INSERT INTO generation_jobs (project_id, kind, provider, input_params, idempotency_key, status, cost_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {JOB_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, Job>(&sql)
            .bind(job.project_id)
            .bind(kind)
            .bind(job.provider)
            .bind(Json(&job.params))
            .bind(&job.idempotency_key)
            .bind(JobStatus::Pending)
            .bind(job.cost_cents)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM generation_jobs WHERE id = $1");
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    #[instrument(skip(self))]
    async fn find_by_idempotency_key(&self, project_id: Uuid, key: &str) -> Result<Option<Job>, StoreError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM generation_jobs WHERE project_id = $1 AND idempotency_key = $2"
        );
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(project_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    #[instrument(skip(self))]
    async fn mark_processing(&self, id: Uuid, external_id: &str) -> Result<Job, StoreError> {
        let sql = format!(
            r#"
            UPDATE generation_jobs
            SET status = 'processing', external_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {JOB_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(job) => Ok(job),
            None => Err(self.transition_failure(id).await),
        }
    }

    #[instrument(skip(self, terminal), fields(status = %terminal.status()))]
    async fn update_terminal(
        &self,
        id: Uuid,
        terminal: TerminalState,
        external_id: Option<&str>,
    ) -> Result<Job, StoreError> {
        let status = terminal.status();
        let (payload, error_info) = match terminal {
            TerminalState::Completed(payload) => (Some(Json(payload)), None),
            TerminalState::Failed(reason) => (None, Some(reason)),
        };

        // Compare-and-swap on the current status: the first terminal write wins.
        let sql = format!(
            r#"
            UPDATE generation_jobs
            SET status = $2,
                result_payload = $3,
                error_info = $4,
                external_id = COALESCE(external_id, $5),
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'processing')
            RETURNING {JOB_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .bind(status)
            .bind(payload)
            .bind(error_info)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(job) => Ok(job),
            None => Err(self.transition_failure(id).await),
        }
    }

    #[instrument(skip(self))]
    async fn list_by_parent(&self, project_id: Uuid, kind: Option<JobKind>) -> Result<Vec<Job>, StoreError> {
        let sql = format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM generation_jobs
            WHERE project_id = $1 AND ($2::job_kind IS NULL OR kind = $2)
            ORDER BY created_at DESC
            "#
        );
        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(project_id)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }
}
