use super::dto::{LoginRequest, RegisterRequest, TokenClaims, AuthResponse, UserResponse};
use super::service::{AuthService, REFRESH_TOKEN_TTL_SECS};
use crate::state::AppState;
use crate::common::response::{ApiResponse, ApiSuccess, ApiError};
use axum::{
    extract::{State, Extension},
    http::{header, StatusCode, HeaderMap},
    response::IntoResponse,
    Json,
};
use tower_cookies::{Cookie, Cookies};

const REFRESH_COOKIE: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

fn refresh_cookie(value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_COOKIE, value);
    cookie.set_http_only(true);
    // Covers both refresh and logout.
    cookie.set_path(REFRESH_COOKIE_PATH);
    cookie.set_secure(false);
    cookie.set_max_age(Some(time::Duration::seconds(REFRESH_TOKEN_TTL_SECS as i64)));
    cookie
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Bad Request")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    match AuthService::register(state, payload).await {
        Ok(user) => ApiSuccess(ApiResponse::success(user, "User registered successfully"), StatusCode::CREATED).into_response(),
        Err(e) => ApiError(e.to_string(), StatusCode::BAD_REQUEST).into_response(),
    }
}

/// Login user and get tokens
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    match AuthService::login(state, payload).await {
        Ok((response, refresh_token)) => {
            cookies.add(refresh_cookie(refresh_token));
            ApiSuccess(ApiResponse::success(response, "Login successful"), StatusCode::OK).into_response()
        }
        Err(e) => ApiError(e.to_string(), StatusCode::UNAUTHORIZED).into_response(),
    }
}

/// Current user profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> impl IntoResponse {
    match AuthService::me(state, claims.sub).await {
        Ok(user) => ApiSuccess(ApiResponse::success(user, "User retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError(e.to_string(), StatusCode::NOT_FOUND).into_response(),
    }
}

/// Logout user
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out successfully", body = ApiResponse<String>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(claims): Extension<TokenClaims>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // Block the access token for the rest of its lifetime.
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if let Some(token) = token {
        let ttl = (claims.exp as u64).saturating_sub(jsonwebtoken::get_current_timestamp());
        if let Err(e) = AuthService::block_token(state.clone(), token, ttl).await {
            tracing::warn!(error = %e, "failed to block access token");
        }
    }

    if let Err(e) = AuthService::logout(state, claims.sub).await {
        tracing::warn!(error = %e, "failed to revoke refresh token");
    }

    let mut cookie = Cookie::new(REFRESH_COOKIE, "");
    cookie.set_path(REFRESH_COOKIE_PATH);
    cookies.remove(cookie);

    ApiSuccess(ApiResponse::success((), "Logged out successfully"), StatusCode::OK).into_response()
}

/// Refresh access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    responses(
        (status = 200, description = "Token refreshed successfully", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    cookies: Cookies,
) -> impl IntoResponse {
    let refresh_token = match cookies.get(REFRESH_COOKIE) {
        Some(c) => c.value().to_string(),
        None => return ApiError::unauthorized("Missing refresh token").into_response(),
    };

    match AuthService::refresh_access(state, &refresh_token).await {
        Ok((response, new_refresh_token)) => {
            cookies.add(refresh_cookie(new_refresh_token));
            ApiSuccess(ApiResponse::success(response, "Token refreshed"), StatusCode::OK).into_response()
        }
        Err(e) => {
            tracing::debug!(error = %e, "refresh rejected");
            ApiError(e.to_string(), StatusCode::UNAUTHORIZED).into_response()
        }
    }
}
