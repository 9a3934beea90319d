use super::dto::{CreateProjectRequest, UpdateProjectRequest};
use super::model::Project;
use super::repository::ProjectRepository;
use crate::common::response::{validation_message, ApiError};
use crate::state::AppState;
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project not found")]
    NotFound,
    #[error("{0}")]
    Invalid(String),
    #[error("Project has generation jobs and cannot be deleted")]
    HasJobs,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ProjectError> for ApiError {
    fn from(e: ProjectError) -> Self {
        match e {
            ProjectError::NotFound => ApiError(e.to_string(), StatusCode::NOT_FOUND),
            ProjectError::Invalid(_) => ApiError(e.to_string(), StatusCode::BAD_REQUEST),
            ProjectError::HasJobs => ApiError(e.to_string(), StatusCode::CONFLICT),
            ProjectError::Internal(err) => {
                tracing::error!(error = %err, "project operation failed");
                ApiError::internal("Internal Server Error")
            }
        }
    }
}

pub struct ProjectService;

impl ProjectService {
    pub async fn create(state: AppState, user_id: Uuid, req: CreateProjectRequest) -> Result<Project, ProjectError> {
        req.validate()
            .map_err(|e| ProjectError::Invalid(validation_message(&e)))?;

        let project =
            ProjectRepository::create(&state.db, user_id, req.title.trim(), req.description.as_deref()).await?;
        tracing::info!(project_id = %project.id, %user_id, "project created");
        Ok(project)
    }

    pub async fn find_all(state: AppState, user_id: Uuid) -> Result<Vec<Project>, ProjectError> {
        Ok(ProjectRepository::find_all_by_user(&state.db, user_id).await?)
    }

    pub async fn find_by_id(state: AppState, user_id: Uuid, id: Uuid) -> Result<Project, ProjectError> {
        ProjectRepository::find_for_user(&state.db, id, user_id)
            .await?
            .ok_or(ProjectError::NotFound)
    }

    pub async fn update(
        state: AppState,
        user_id: Uuid,
        id: Uuid,
        req: UpdateProjectRequest,
    ) -> Result<Project, ProjectError> {
        req.validate()
            .map_err(|e| ProjectError::Invalid(validation_message(&e)))?;

        ProjectRepository::update(&state.db, id, user_id, req)
            .await?
            .ok_or(ProjectError::NotFound)
    }

    /// Jobs are permanent records, so a project that has any stays.
    pub async fn delete(state: AppState, user_id: Uuid, id: Uuid) -> Result<(), ProjectError> {
        let project = ProjectRepository::find_for_user(&state.db, id, user_id)
            .await?
            .ok_or(ProjectError::NotFound)?;

        if ProjectRepository::count_jobs(&state.db, project.id).await? > 0 {
            return Err(ProjectError::HasJobs);
        }

        if !ProjectRepository::delete(&state.db, project.id, user_id).await? {
            return Err(ProjectError::NotFound);
        }
        Ok(())
    }
}
