use super::dto::{CreateProjectRequest, UpdateProjectRequest};
use super::model::Project;
use super::service::ProjectService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::auth::dto::TokenClaims;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// List the caller's projects
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    responses(
        (status = 200, description = "List of projects", body = ApiResponse<Vec<Project>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Projects",
    security(("bearer_auth" = []))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> impl IntoResponse {
    match ProjectService::find_all(state, claims.sub).await {
        Ok(projects) => ApiSuccess(
            ApiResponse::success(projects, "Projects retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Create a new project
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ApiResponse<Project>),
        (status = 400, description = "Bad Request")
    ),
    tag = "Projects",
    security(("bearer_auth" = []))
)]
pub async fn create_project(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Json(payload): Json<CreateProjectRequest>,
) -> impl IntoResponse {
    match ProjectService::create(state, claims.sub, payload).await {
        Ok(project) => ApiSuccess(
            ApiResponse::success(project, "Project created successfully"),
            StatusCode::CREATED,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Get project by ID
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project details", body = ApiResponse<Project>),
        (status = 404, description = "Project not found")
    ),
    tag = "Projects",
    security(("bearer_auth" = []))
)]
pub async fn get_project(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match ProjectService::find_by_id(state, claims.sub, id).await {
        Ok(project) => ApiSuccess(
            ApiResponse::success(project, "Project retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Update project
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ApiResponse<Project>),
        (status = 400, description = "Bad Request"),
        (status = 404, description = "Project not found")
    ),
    tag = "Projects",
    security(("bearer_auth" = []))
)]
pub async fn update_project(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> impl IntoResponse {
    match ProjectService::update(state, claims.sub, id, payload).await {
        Ok(project) => ApiSuccess(
            ApiResponse::success(project, "Project updated successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Delete project
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project deleted", body = ApiResponse<String>),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Project has generation jobs")
    ),
    tag = "Projects",
    security(("bearer_auth" = []))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match ProjectService::delete(state, claims.sub, id).await {
        Ok(_) => ApiSuccess(
            ApiResponse::success((), "Project deleted successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
