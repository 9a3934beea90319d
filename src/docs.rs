use utoipa::OpenApi;
use utoipa::Modify;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};
use crate::modules::auth::dto::*;
use crate::modules::auth::model::{UserPlan, UserRole};
use crate::modules::generation::dto::*;
use crate::modules::generation::model::*;
use crate::modules::integration::dto::*;
use crate::modules::project::dto::*;
use crate::modules::project::model::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::handler::register,
        crate::modules::auth::handler::login,
        crate::modules::auth::handler::logout,
        crate::modules::auth::handler::refresh,
        crate::modules::auth::handler::get_me,
        crate::modules::project::handler::list_projects,
        crate::modules::project::handler::create_project,
        crate::modules::project::handler::get_project,
        crate::modules::project::handler::update_project,
        crate::modules::project::handler::delete_project,
        crate::modules::integration::handler::list_integrations,
        crate::modules::integration::handler::connect_integration,
        crate::modules::integration::handler::disconnect_integration,
        crate::modules::generation::handler::submit_job,
        crate::modules::generation::handler::generate_music,
        crate::modules::generation::handler::separate_stems,
        crate::modules::generation::handler::generate_video,
        crate::modules::generation::handler::publish,
        crate::modules::generation::handler::list_jobs,
        crate::modules::generation::handler::poll_job,
        crate::modules::generation::handler::list_providers,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, AuthResponse, UserResponse, UserRole, UserPlan,
            Project, ProjectStatus, CreateProjectRequest, UpdateProjectRequest,
            ConnectIntegrationRequest, IntegrationResponse,
            Job, JobKind, JobStatus, Provider, JobParams, MusicParams, StemParams, VideoParams,
            PublicationParams, ResultPayload,
            SubmitJobRequest, GenerateMusicRequest, SeparateStemsRequest, GenerateVideoRequest, PublishRequest, ProviderInfo,
        )
    ),
    tags(
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Projects", description = "Project management"),
        (name = "Integrations", description = "Publishing platform credentials"),
        (name = "Jobs", description = "Music, video and publication jobs")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
