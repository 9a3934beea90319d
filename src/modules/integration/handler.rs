use super::dto::{ConnectIntegrationRequest, IntegrationResponse};
use super::service::IntegrationService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::auth::dto::TokenClaims;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// List connected publishing platforms
#[utoipa::path(
    get,
    path = "/api/v1/integrations",
    responses(
        (status = 200, description = "Connected platforms", body = ApiResponse<Vec<IntegrationResponse>>)
    ),
    tag = "Integrations",
    security(("bearer_auth" = []))
)]
pub async fn list_integrations(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> impl IntoResponse {
    match IntegrationService::list(state, claims.sub).await {
        Ok(list) => ApiSuccess(
            ApiResponse::success(list, "Integrations retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Store credentials for a publishing platform
#[utoipa::path(
    put,
    path = "/api/v1/integrations/{platform}",
    params(
        ("platform" = String, Path, description = "youtube, tiktok or facebook")
    ),
    request_body = ConnectIntegrationRequest,
    responses(
        (status = 200, description = "Platform connected", body = ApiResponse<IntegrationResponse>),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Integrations",
    security(("bearer_auth" = []))
)]
pub async fn connect_integration(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(platform): Path<String>,
    Json(payload): Json<ConnectIntegrationRequest>,
) -> impl IntoResponse {
    let platform = match IntegrationService::parse_platform(&platform) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match IntegrationService::connect(state, claims.sub, platform, payload).await {
        Ok(integration) => ApiSuccess(
            ApiResponse::success(integration, "Platform connected successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Remove stored credentials for a platform
#[utoipa::path(
    delete,
    path = "/api/v1/integrations/{platform}",
    params(
        ("platform" = String, Path, description = "youtube, tiktok or facebook")
    ),
    responses(
        (status = 200, description = "Platform disconnected", body = ApiResponse<String>),
        (status = 404, description = "Platform not connected")
    ),
    tag = "Integrations",
    security(("bearer_auth" = []))
)]
pub async fn disconnect_integration(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(platform): Path<String>,
) -> impl IntoResponse {
    let platform = match IntegrationService::parse_platform(&platform) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match IntegrationService::disconnect(state, claims.sub, platform).await {
        Ok(_) => ApiSuccess(
            ApiResponse::success((), "Platform disconnected successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
