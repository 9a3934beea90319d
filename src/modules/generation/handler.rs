use super::dto::{
    GenerateMusicRequest, GenerateVideoRequest, ListJobsQuery, ProviderInfo, PublishRequest, SeparateStemsRequest,
    SubmitJobRequest,
};
use super::model::Job;
use super::service::SubmitJob;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::auth::dto::TokenClaims;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

async fn submit(state: AppState, claims: TokenClaims, project_id: Uuid, request: SubmitJob) -> axum::response::Response {
    match state.jobs.submit_job(claims.sub, project_id, request).await {
        Ok(job) => ApiSuccess(ApiResponse::success(job, "Job submitted"), StatusCode::CREATED).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Submit a job to any enabled provider
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/jobs",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = SubmitJobRequest,
    responses(
        (status = 201, description = "Job submitted", body = ApiResponse<Job>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the project owner"),
        (status = 502, description = "Provider unavailable")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn submit_job(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<SubmitJobRequest>,
) -> impl IntoResponse {
    submit(state, claims, project_id, payload.into()).await
}

/// Generate music for a project
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/music",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = GenerateMusicRequest,
    responses(
        (status = 201, description = "Music generation submitted", body = ApiResponse<Job>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the project owner"),
        (status = 502, description = "Provider unavailable")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn generate_music(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<GenerateMusicRequest>,
) -> impl IntoResponse {
    submit(state, claims, project_id, payload.into()).await
}

/// Split a track into vocals and instrumental
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/stems",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = SeparateStemsRequest,
    responses(
        (status = 201, description = "Stem separation submitted", body = ApiResponse<Job>),
        (status = 400, description = "Invalid input or MusicGPT not enabled"),
        (status = 403, description = "Not the project owner"),
        (status = 502, description = "Provider unavailable")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn separate_stems(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<SeparateStemsRequest>,
) -> impl IntoResponse {
    submit(state, claims, project_id, payload.into()).await
}

/// Generate a video for a project
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/videos",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = GenerateVideoRequest,
    responses(
        (status = 201, description = "Video generation submitted", body = ApiResponse<Job>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the project owner"),
        (status = 502, description = "Provider unavailable")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn generate_video(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<GenerateVideoRequest>,
) -> impl IntoResponse {
    submit(state, claims, project_id, payload.into()).await
}

/// Publish a project video to a platform
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/publications",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = PublishRequest,
    responses(
        (status = 201, description = "Publication submitted", body = ApiResponse<Job>),
        (status = 400, description = "Invalid input or platform not connected"),
        (status = 403, description = "Not the project owner"),
        (status = 502, description = "Platform unavailable")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn publish(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<PublishRequest>,
) -> impl IntoResponse {
    submit(state, claims, project_id, payload.into()).await
}

/// List the jobs of a project
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/jobs",
    params(("id" = Uuid, Path, description = "Project ID"), ListJobsQuery),
    responses(
        (status = 200, description = "Jobs of the project", body = ApiResponse<Vec<Job>>),
        (status = 403, description = "Not the project owner")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<ListJobsQuery>,
) -> impl IntoResponse {
    match state.jobs.list_jobs_for_parent(claims.sub, project_id, query.kind).await {
        Ok(jobs) => ApiSuccess(ApiResponse::success(jobs, "Jobs retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Poll a job; reconciles its state with the provider unless already terminal
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Current job state", body = ApiResponse<Job>),
        (status = 403, description = "Not the project owner"),
        (status = 404, description = "Job not found"),
        (status = 502, description = "Provider unavailable, retry later")
    ),
    tag = "Jobs",
    security(("bearer_auth" = []))
)]
pub async fn poll_job(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(job_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.jobs.poll_job(claims.sub, job_id).await {
        Ok(job) => ApiSuccess(ApiResponse::success(job, "Job retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Providers enabled on this deployment and their price per job
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    responses(
        (status = 200, description = "Enabled providers", body = ApiResponse<Vec<ProviderInfo>>)
    ),
    tag = "Jobs"
)]
pub async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    let providers: Vec<ProviderInfo> = state
        .jobs
        .enabled_providers()
        .into_iter()
        .map(ProviderInfo::from)
        .collect();

    ApiSuccess(ApiResponse::success(providers, "Providers retrieved successfully"), StatusCode::OK)
}
