use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::model::ProjectStatus;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    #[validate(url(message = "Music URL must be a valid URL"))]
    pub music_url: Option<String>,
    #[validate(url(message = "Video URL must be a valid URL"))]
    pub video_url: Option<String>,
    #[validate(url(message = "Thumbnail URL must be a valid URL"))]
    pub thumbnail_url: Option<String>,
}
