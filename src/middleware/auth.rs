use crate::modules::auth::dto::TokenClaims;
use crate::state::AppState;
use crate::common::response::ApiError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use redis::AsyncCommands;

/// Bearer-token gate: rejects revoked or invalid JWTs and exposes the
/// decoded `TokenClaims` to handlers through request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(str::to_owned)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized: Missing or invalid token"))?;

    let mut redis = state
        .redis
        .get_conn()
        .await
        .map_err(|_| ApiError::internal("Internal Server Error: Redis unavailable"))?;

    let is_blocked: bool = redis
        .exists(format!("blocked_token:{}", token))
        .await
        .map_err(|_| ApiError::internal("Internal Server Error: Redis error"))?;

    if is_blocked {
        return Err(ApiError::unauthorized("Unauthorized: Token is blocked/revoked"));
    }

    let claims = decode::<TokenClaims>(
        &token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::unauthorized("Unauthorized: Invalid token signature"))?
    .claims;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
