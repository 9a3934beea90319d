use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Barrier;
use uuid::Uuid;

use studio_backend::modules::generation::error::{JobError, ProviderError};
use studio_backend::modules::generation::guard::{AccessGuard, CredentialSource, ProjectOwnership};
use studio_backend::modules::generation::memory::InMemoryJobStore;
use studio_backend::modules::generation::model::{
    JobKind, JobParams, JobStatus, MusicParams, Provider, PublicationParams, ResultPayload, StemParams,
    VideoParams,
};
use studio_backend::modules::generation::provider::{
    AdapterRegistry, PollRequest, ProviderAdapter, ProviderStatus, SubmitOutcome, SubmitRequest,
};
use studio_backend::modules::generation::repository::JobStore;
use studio_backend::modules::generation::service::{
    JobOrchestrator, OrchestratorSettings, SubmitJob, MAX_POLL_ATTEMPTS,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct Projects(HashMap<Uuid, Uuid>);

#[async_trait]
impl ProjectOwnership for Projects {
    async fn owner_of(&self, project_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        Ok(self.0.get(&project_id).copied())
    }
}

struct Credentials {
    token: Mutex<Option<String>>,
    barrier: Option<Arc<Barrier>>,
}

impl Credentials {
    fn new(token: Option<&str>) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_string)),
            barrier: None,
        }
    }

    /// Holds every lookup until the barrier's party is complete.
    fn gated(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    fn revoke(&self) {
        *self.token.lock().unwrap() = None;
    }
}

#[async_trait]
impl CredentialSource for Credentials {
    async fn access_token(&self, _user_id: Uuid, _provider: Provider) -> anyhow::Result<Option<String>> {
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        Ok(self.token.lock().unwrap().clone())
    }
}

struct ScriptedAdapter {
    provider: Provider,
    store: Option<Arc<InMemoryJobStore>>,
    submit_result: Result<SubmitOutcome, ProviderError>,
    submit_delay: Option<Duration>,
    submit_budget: Option<Duration>,
    polls: Mutex<VecDeque<Result<ProviderStatus, ProviderError>>>,
    barrier: Option<Arc<Barrier>>,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    status_at_submit: Mutex<Option<JobStatus>>,
    token_at_submit: Mutex<Option<String>>,
}

impl ScriptedAdapter {
    fn new(provider: Provider) -> Self {
        Self {
            provider,
            store: None,
            submit_result: Ok(SubmitOutcome::accepted("ext-1")),
            submit_delay: None,
            submit_budget: None,
            polls: Mutex::new(VecDeque::new()),
            barrier: None,
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            status_at_submit: Mutex::new(None),
            token_at_submit: Mutex::new(None),
        }
    }

    fn observing(mut self, store: &Arc<InMemoryJobStore>) -> Self {
        self.store = Some(store.clone());
        self
    }

    fn submit_returns(mut self, result: Result<SubmitOutcome, ProviderError>) -> Self {
        self.submit_result = result;
        self
    }

    fn submit_takes(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    fn submit_budget(mut self, budget: Duration) -> Self {
        self.submit_budget = Some(budget);
        self
    }

    fn polls(self, script: Vec<Result<ProviderStatus, ProviderError>>) -> Self {
        *self.polls.lock().unwrap() = script.into();
        self
    }

    fn poll_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn submit_timeout(&self) -> Option<Duration> {
        self.submit_budget
    }

    async fn submit(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.token_at_submit.lock().unwrap() = request.access_token.clone();

        if let Some(store) = &self.store {
            let job = store.get(request.job_id).await.unwrap();
            *self.status_at_submit.lock().unwrap() = job.map(|j| j.status);
        }
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        self.submit_result.clone()
    }

    async fn poll(&self, _request: &PollRequest<'_>) -> Result<ProviderStatus, ProviderError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ProviderStatus::Processing));

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        next
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    orchestrator: JobOrchestrator,
    owner: Uuid,
    project: Uuid,
}

fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        timeout: Duration::from_millis(200),
        poll_attempts: 1,
        retry_base: Duration::from_millis(1),
    }
}

fn harness_with(
    store: Arc<InMemoryJobStore>,
    adapters: Vec<Arc<ScriptedAdapter>>,
    token: Option<&str>,
    settings: OrchestratorSettings,
) -> Harness {
    harness_sharing(store, adapters, Arc::new(Credentials::new(token)), settings)
}

fn harness_sharing(
    store: Arc<InMemoryJobStore>,
    adapters: Vec<Arc<ScriptedAdapter>>,
    credentials: Arc<Credentials>,
    settings: OrchestratorSettings,
) -> Harness {
    let owner = Uuid::new_v4();
    let project = Uuid::new_v4();

    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register(adapter);
    }

    let orchestrator = JobOrchestrator::new(
        store,
        AccessGuard::new(Arc::new(Projects(HashMap::from([(project, owner)])))),
        registry,
        credentials,
        settings,
    );

    Harness {
        orchestrator,
        owner,
        project,
    }
}

fn harness(store: Arc<InMemoryJobStore>, adapters: Vec<Arc<ScriptedAdapter>>) -> Harness {
    harness_with(store, adapters, None, settings())
}

fn music_params() -> JobParams {
    JobParams::Music(MusicParams {
        prompt: "upbeat pop song about summer".into(),
        genre: Some("pop".into()),
        mood: None,
        duration: Some(120),
        instrumental: false,
        custom_lyrics: None,
        need_stems: false,
    })
}

fn video_params() -> JobParams {
    JobParams::Video(VideoParams {
        prompt: "neon city at night".into(),
        music_url: Some("https://x/a.mp3".into()),
        style: None,
        resolution: Some("1080p".into()),
    })
}

fn publication_params() -> JobParams {
    JobParams::Publication(PublicationParams {
        title: "Summer single".into(),
        description: String::new(),
        video_url: "https://x/v.mp4".into(),
        tags: vec![],
        privacy: None,
        page_id: None,
    })
}

fn submit(provider: Provider, params: JobParams) -> SubmitJob {
    SubmitJob {
        provider,
        params,
        idempotency_key: None,
    }
}

fn completed_audio() -> ProviderStatus {
    ProviderStatus::Completed(ResultPayload {
        audio_url: Some("https://x/a.mp3".into()),
        ..Default::default()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn music_job_runs_from_pending_to_completed() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(
        ScriptedAdapter::new(Provider::Suno)
            .observing(&store)
            .submit_returns(Ok(SubmitOutcome::accepted("ext-1")))
            .polls(vec![Ok(ProviderStatus::Processing), Ok(completed_audio())]),
    );
    let h = harness(store.clone(), vec![suno.clone()]);

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();

    assert_eq!(*suno.status_at_submit.lock().unwrap(), Some(JobStatus::Pending));
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.external_id.as_deref(), Some("ext-1"));
    assert_eq!(job.cost_cents, 2);
    assert_eq!(job.kind, JobKind::Music);
    assert!(job.completed_at.is_none());

    let job = h.orchestrator.poll_job(h.owner, job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Processing);

    let job = h.orchestrator.poll_job(h.owner, job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(
        job.result().and_then(|r| r.audio_url.as_deref()),
        Some("https://x/a.mp3")
    );
    let completed_at = job.completed_at.expect("completed_at set");

    let again = h.orchestrator.poll_job(h.owner, job.id).await.unwrap();
    assert_eq!(again.completed_at, Some(completed_at));
    assert_eq!(suno.poll_calls(), 2);
    assert_eq!(store.terminal_writes(), 1);
}

#[tokio::test]
async fn foreign_user_cannot_submit_and_nothing_is_stored() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno));
    let h = harness(store.clone(), vec![suno.clone()]);

    let result = h
        .orchestrator
        .submit_job(Uuid::new_v4(), h.project, submit(Provider::Suno, music_params()))
        .await;

    assert!(matches!(result, Err(JobError::NotAuthorized)));
    assert!(store.is_empty().await);
    assert_eq!(suno.submit_calls(), 0);
}

#[tokio::test]
async fn unknown_project_is_not_authorized() {
    let store = Arc::new(InMemoryJobStore::new());
    let h = harness(store.clone(), vec![Arc::new(ScriptedAdapter::new(Provider::Suno))]);

    let result = h
        .orchestrator
        .submit_job(h.owner, Uuid::new_v4(), submit(Provider::Suno, music_params()))
        .await;

    assert!(matches!(result, Err(JobError::NotAuthorized)));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn transport_failure_at_submit_leaves_failed_job() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(
        ScriptedAdapter::new(Provider::Suno)
            .submit_returns(Err(ProviderError::Unavailable("connection refused".into()))),
    );
    let h = harness(store.clone(), vec![suno]);

    let result = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await;
    assert!(matches!(result, Err(JobError::ProviderUnavailable(_))));

    let jobs = store.list_by_parent(h.project, None).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Failed);
    assert!(jobs[0].error_info.as_deref().unwrap().contains("connection refused"));
    assert!(jobs[0].completed_at.is_some());
}

#[tokio::test]
async fn auth_failure_at_submit_surfaces_as_provider_auth_error() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(
        ScriptedAdapter::new(Provider::Suno).submit_returns(Err(ProviderError::Auth("status 401".into()))),
    );
    let h = harness(store.clone(), vec![suno]);

    let result = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await;
    assert!(matches!(result, Err(JobError::ProviderAuthError(_))));

    let jobs = store.list_by_parent(h.project, None).await.unwrap();
    assert_eq!(jobs[0].status, JobStatus::Failed);
}

#[tokio::test]
async fn business_refusal_is_a_failed_job_not_an_error() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(
        ScriptedAdapter::new(Provider::Suno).submit_returns(Ok(SubmitOutcome::rejected("quota exceeded"))),
    );
    let h = harness(store.clone(), vec![suno]);

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_info.as_deref(), Some("quota exceeded"));
}

#[tokio::test]
async fn synchronous_completion_skips_processing() {
    let store = Arc::new(InMemoryJobStore::new());
    let runway = Arc::new(ScriptedAdapter::new(Provider::Runway).submit_returns(Ok(SubmitOutcome {
        external_id: Some("task-9".into()),
        status: ProviderStatus::Completed(ResultPayload {
            video_url: Some("https://x/v.mp4".into()),
            ..Default::default()
        }),
    })));
    let h = harness(store.clone(), vec![runway.clone()]);

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Runway, video_params()))
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.external_id.as_deref(), Some("task-9"));
    assert_eq!(job.cost_cents, 1500);

    h.orchestrator.poll_job(h.owner, job.id).await.unwrap();
    assert_eq!(runway.poll_calls(), 0);
}

#[tokio::test]
async fn accepted_without_external_id_is_failed() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno).submit_returns(Ok(SubmitOutcome {
        external_id: None,
        status: ProviderStatus::Processing,
    })));
    let h = harness(store.clone(), vec![suno]);

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Failed);
}

#[tokio::test]
async fn polling_a_terminal_job_never_calls_the_provider() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno).polls(vec![Ok(completed_audio())]));
    let h = harness(store.clone(), vec![suno.clone()]);

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();
    let done = h.orchestrator.poll_job(h.owner, job.id).await.unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(suno.poll_calls(), 1);

    for _ in 0..3 {
        let again = h.orchestrator.poll_job(h.owner, job.id).await.unwrap();
        assert_eq!(again, done);
    }
    assert_eq!(suno.poll_calls(), 1);
}

#[tokio::test]
async fn concurrent_polls_apply_one_terminal_write() {
    let store = Arc::new(InMemoryJobStore::new());
    let barrier = Arc::new(Barrier::new(2));
    let suno = Arc::new(
        ScriptedAdapter::new(Provider::Suno)
            .polls(vec![Ok(completed_audio()), Ok(completed_audio())])
            .poll_barrier(barrier),
    );
    let h = harness(store.clone(), vec![suno.clone()]);

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        h.orchestrator.poll_job(h.owner, job.id),
        h.orchestrator.poll_job(h.owner, job.id)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(suno.poll_calls(), 2);
    assert_eq!(store.terminal_writes(), 1);
    assert_eq!(a.status, JobStatus::Completed);
    assert_eq!(b.status, JobStatus::Completed);
    assert_eq!(a.completed_at, b.completed_at);
}

#[tokio::test]
async fn poll_error_does_not_touch_the_job() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(
        ScriptedAdapter::new(Provider::Suno).polls(vec![Err(ProviderError::Auth("status 403".into()))]),
    );
    let h = harness(store.clone(), vec![suno]);

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();

    let result = h.orchestrator.poll_job(h.owner, job.id).await;
    assert!(matches!(result, Err(JobError::ProviderAuthError(_))));

    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored, job);
}

#[tokio::test]
async fn unavailable_poll_is_retried_with_backoff() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno).polls(vec![
        Err(ProviderError::Unavailable("status 503".into())),
        Err(ProviderError::Unavailable("status 503".into())),
        Ok(completed_audio()),
    ]));
    let h = harness_with(
        store.clone(),
        vec![suno.clone()],
        None,
        OrchestratorSettings {
            poll_attempts: 3,
            ..settings()
        },
    );

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();
    let job = h.orchestrator.poll_job(h.owner, job.id).await.unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(suno.poll_calls(), 3);
}

#[tokio::test]
async fn exhausted_retries_surface_unavailable() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno).polls(vec![
        Err(ProviderError::Unavailable("status 503".into())),
        Err(ProviderError::Unavailable("status 503".into())),
    ]));
    let h = harness_with(
        store.clone(),
        vec![suno.clone()],
        None,
        OrchestratorSettings {
            poll_attempts: 2,
            ..settings()
        },
    );

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();
    let result = h.orchestrator.poll_job(h.owner, job.id).await;

    assert!(matches!(result, Err(JobError::ProviderUnavailable(_))));
    assert_eq!(suno.poll_calls(), 2);
    assert_eq!(store.get(job.id).await.unwrap().unwrap().status, JobStatus::Processing);
}

#[tokio::test]
async fn slow_provider_times_out_as_unavailable() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno).submit_takes(Duration::from_secs(5)));
    let h = harness_with(
        store.clone(),
        vec![suno],
        None,
        OrchestratorSettings {
            timeout: Duration::from_millis(50),
            ..settings()
        },
    );

    let result = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await;
    assert!(matches!(result, Err(JobError::ProviderUnavailable(_))));

    let jobs = store.list_by_parent(h.project, None).await.unwrap();
    assert_eq!(jobs[0].status, JobStatus::Failed);
    assert!(jobs[0].error_info.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn cost_comes_from_the_price_table() {
    let store = Arc::new(InMemoryJobStore::new());
    let h = harness(
        store.clone(),
        vec![
            Arc::new(ScriptedAdapter::new(Provider::Suno)),
            Arc::new(ScriptedAdapter::new(Provider::MusicGpt)),
        ],
    );

    for _ in 0..2 {
        let job = h
            .orchestrator
            .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
            .await
            .unwrap();
        assert_eq!(job.cost_cents, 2);
    }
    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::MusicGpt, music_params()))
        .await
        .unwrap();
    assert_eq!(job.cost_cents, 3);
}

#[tokio::test]
async fn idempotency_key_returns_the_existing_job() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno));
    let h = harness(store.clone(), vec![suno.clone()]);

    let request = SubmitJob {
        idempotency_key: Some("release-42".into()),
        ..submit(Provider::Suno, music_params())
    };
    let first = h
        .orchestrator
        .submit_job(h.owner, h.project, request.clone())
        .await
        .unwrap();
    let second = h.orchestrator.submit_job(h.owner, h.project, request).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(suno.submit_calls(), 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn params_must_match_the_provider_kind() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno));
    let h = harness(store.clone(), vec![suno.clone()]);

    let result = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, video_params()))
        .await;

    assert!(matches!(result, Err(JobError::InvalidInput(_))));
    assert!(store.is_empty().await);
    assert_eq!(suno.submit_calls(), 0);
}

#[tokio::test]
async fn invalid_params_are_rejected_before_persisting() {
    let store = Arc::new(InMemoryJobStore::new());
    let h = harness(store.clone(), vec![Arc::new(ScriptedAdapter::new(Provider::Suno))]);

    let params = JobParams::Music(MusicParams {
        prompt: "short".into(),
        genre: None,
        mood: None,
        duration: None,
        instrumental: false,
        custom_lyrics: None,
        need_stems: false,
    });
    let result = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, params))
        .await;

    assert!(matches!(result, Err(JobError::InvalidInput(_))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn unregistered_provider_is_invalid_input() {
    let store = Arc::new(InMemoryJobStore::new());
    let h = harness(store.clone(), vec![Arc::new(ScriptedAdapter::new(Provider::Suno))]);

    let result = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Kling, video_params()))
        .await;

    assert!(matches!(result, Err(JobError::InvalidInput(_))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn publishing_needs_a_connected_platform() {
    let store = Arc::new(InMemoryJobStore::new());
    let youtube = Arc::new(ScriptedAdapter::new(Provider::YouTube));
    let h = harness(store.clone(), vec![youtube.clone()]);

    let result = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::YouTube, publication_params()))
        .await;

    assert!(matches!(result, Err(JobError::InvalidInput(_))));
    assert!(store.is_empty().await);
    assert_eq!(youtube.submit_calls(), 0);
}

#[tokio::test]
async fn publishing_passes_the_stored_token_to_the_adapter() {
    let store = Arc::new(InMemoryJobStore::new());
    let tiktok = Arc::new(ScriptedAdapter::new(Provider::TikTok));
    let h = harness_with(store.clone(), vec![tiktok.clone()], Some("user-token"), settings());

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::TikTok, publication_params()))
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.cost_cents, 0);
    assert_eq!(tiktok.token_at_submit.lock().unwrap().as_deref(), Some("user-token"));
}

#[tokio::test]
async fn only_the_owner_can_poll() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno));
    let h = harness(store.clone(), vec![suno.clone()]);

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();

    let result = h.orchestrator.poll_job(Uuid::new_v4(), job.id).await;
    assert!(matches!(result, Err(JobError::NotAuthorized)));
    assert_eq!(suno.poll_calls(), 0);
}

#[tokio::test]
async fn polling_an_unknown_job_is_not_found() {
    let store = Arc::new(InMemoryJobStore::new());
    let h = harness(store, vec![]);

    let result = h.orchestrator.poll_job(h.owner, Uuid::new_v4()).await;
    assert!(matches!(result, Err(JobError::NotFound(_))));
}

#[tokio::test]
async fn listing_is_owner_only_and_filters_by_kind() {
    let store = Arc::new(InMemoryJobStore::new());
    let h = harness(
        store.clone(),
        vec![
            Arc::new(ScriptedAdapter::new(Provider::Suno)),
            Arc::new(ScriptedAdapter::new(Provider::Kling)),
        ],
    );

    h.orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();
    h.orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Kling, video_params()))
        .await
        .unwrap();

    let all = h
        .orchestrator
        .list_jobs_for_parent(h.owner, h.project, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let music = h
        .orchestrator
        .list_jobs_for_parent(h.owner, h.project, Some(JobKind::Music))
        .await
        .unwrap();
    assert_eq!(music.len(), 1);
    assert_eq!(music[0].provider, Provider::Suno);

    let result = h
        .orchestrator
        .list_jobs_for_parent(Uuid::new_v4(), h.project, None)
        .await;
    assert!(matches!(result, Err(JobError::NotAuthorized)));
}

#[tokio::test]
async fn concurrent_submissions_with_one_key_store_one_job() {
    let store = Arc::new(InMemoryJobStore::new());
    let tiktok = Arc::new(ScriptedAdapter::new(Provider::TikTok));
    // Both submissions pass the key lookup before either persists.
    let credentials = Arc::new(Credentials::new(Some("user-token")).gated(Arc::new(Barrier::new(2))));
    let h = harness_sharing(store.clone(), vec![tiktok.clone()], credentials, settings());

    let request = SubmitJob {
        idempotency_key: Some("launch-day".into()),
        ..submit(Provider::TikTok, publication_params())
    };
    let (first, second) = tokio::join!(
        h.orchestrator.submit_job(h.owner, h.project, request.clone()),
        h.orchestrator.submit_job(h.owner, h.project, request),
    );

    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.id, second.id);
    assert_eq!(store.len().await, 1);
    assert_eq!(tiktok.submit_calls(), 1);
}

#[tokio::test]
async fn reused_key_with_a_different_request_is_rejected() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno));
    let musicgpt = Arc::new(ScriptedAdapter::new(Provider::MusicGpt));
    let h = harness(store.clone(), vec![suno.clone(), musicgpt.clone()]);

    let keyed = |provider, params| SubmitJob {
        idempotency_key: Some("release-42".into()),
        ..submit(provider, params)
    };
    h.orchestrator
        .submit_job(h.owner, h.project, keyed(Provider::Suno, music_params()))
        .await
        .unwrap();

    let other_params = JobParams::Music(MusicParams {
        prompt: "slow acoustic ballad about rain".into(),
        genre: None,
        mood: None,
        duration: None,
        instrumental: true,
        custom_lyrics: None,
        need_stems: false,
    });
    let changed_params = h
        .orchestrator
        .submit_job(h.owner, h.project, keyed(Provider::Suno, other_params))
        .await;
    let changed_provider = h
        .orchestrator
        .submit_job(h.owner, h.project, keyed(Provider::MusicGpt, music_params()))
        .await;

    assert!(matches!(changed_params, Err(JobError::InvalidInput(_))));
    assert!(matches!(changed_provider, Err(JobError::InvalidInput(_))));
    assert_eq!(store.len().await, 1);
    assert_eq!(suno.submit_calls(), 1);
    assert_eq!(musicgpt.submit_calls(), 0);
}

#[tokio::test]
async fn poll_latency_is_bounded_whatever_the_settings() {
    let store = Arc::new(InMemoryJobStore::new());
    let always_down = (0..50)
        .map(|_| Err(ProviderError::Unavailable("503".into())))
        .collect();
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno).polls(always_down));
    let h = harness_with(
        store.clone(),
        vec![suno.clone()],
        None,
        OrchestratorSettings {
            timeout: Duration::from_millis(50),
            poll_attempts: 50,
            retry_base: Duration::from_secs(10),
        },
    );

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, music_params()))
        .await
        .unwrap();

    let started = Instant::now();
    let result = h.orchestrator.poll_job(h.owner, job.id).await;

    assert!(matches!(result, Err(JobError::ProviderUnavailable(_))));
    assert_eq!(suno.poll_calls(), MAX_POLL_ATTEMPTS as usize);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn polling_after_disconnecting_asks_to_reconnect() {
    let store = Arc::new(InMemoryJobStore::new());
    let tiktok = Arc::new(ScriptedAdapter::new(Provider::TikTok));
    let credentials = Arc::new(Credentials::new(Some("user-token")));
    let h = harness_sharing(store.clone(), vec![tiktok.clone()], credentials.clone(), settings());

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::TikTok, publication_params()))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Processing);

    credentials.revoke();
    let result = h.orchestrator.poll_job(h.owner, job.id).await;

    let Err(JobError::InvalidInput(message)) = result else {
        panic!("expected invalid input");
    };
    assert!(message.contains("reconnect"));
    assert!(!message.contains("before publishing"));
    assert_eq!(tiktok.poll_calls(), 0);
    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Processing);
}

#[tokio::test]
async fn stem_separation_runs_on_musicgpt_only() {
    let store = Arc::new(InMemoryJobStore::new());
    let suno = Arc::new(ScriptedAdapter::new(Provider::Suno));
    let musicgpt = Arc::new(ScriptedAdapter::new(Provider::MusicGpt));
    let h = harness(store.clone(), vec![suno.clone(), musicgpt.clone()]);

    let stems = || {
        JobParams::Stems(StemParams {
            audio_url: "https://x/a.mp3".into(),
        })
    };

    let on_suno = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::Suno, stems()))
        .await;
    assert!(matches!(on_suno, Err(JobError::InvalidInput(_))));
    assert_eq!(suno.submit_calls(), 0);

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::MusicGpt, stems()))
        .await
        .unwrap();
    assert_eq!(job.kind, JobKind::Music);
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.params(), &stems());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn adapter_budget_replaces_the_default_submit_timeout() {
    let store = Arc::new(InMemoryJobStore::new());
    let youtube = Arc::new(
        ScriptedAdapter::new(Provider::YouTube)
            .submit_takes(Duration::from_millis(400))
            .submit_budget(Duration::from_secs(5)),
    );
    let h = harness_with(store.clone(), vec![youtube.clone()], Some("user-token"), settings());

    let job = h
        .orchestrator
        .submit_job(h.owner, h.project, submit(Provider::YouTube, publication_params()))
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(youtube.submit_calls(), 1);
}

