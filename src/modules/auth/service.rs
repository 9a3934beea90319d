use super::dto::{AuthResponse, LoginRequest, RegisterRequest, TokenClaims, UserResponse};
use super::model::{User, UserRole};
use super::repository::AuthRepository;
use crate::state::AppState;
use crate::common::response::validation_message;
use crate::common::security;
use anyhow::{anyhow, Result};
use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
use uuid::Uuid;
use validator::Validate;

pub const ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;
pub const REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

pub struct AuthService;

impl AuthService {
    pub async fn register(state: AppState, req: RegisterRequest) -> Result<UserResponse> {
        req.validate().map_err(|e| anyhow!(validation_message(&e)))?;
        let email = req.email.trim().to_lowercase();

        if AuthRepository::find_user_by_email(&state.db, &email)
            .await?
            .is_some()
        {
            return Err(anyhow!("Email already exists"));
        }

        let password_hash = security::hash_password(&req.password)?;

        let user = AuthRepository::create_user(&state.db, &email, req.name.trim(), &password_hash).await?;
        tracing::info!(user_id = %user.id, "user registered");

        Ok(user.into())
    }

    pub async fn login(state: AppState, req: LoginRequest) -> Result<(AuthResponse, String)> {
        let email = req.email.trim().to_lowercase();
        let user = AuthRepository::find_user_by_email(&state.db, &email)
            .await?
            .ok_or_else(|| anyhow!("Invalid credentials"))?;

        security::verify_password(&req.password, &user.password_hash)
            .map_err(|_| anyhow!("Invalid credentials"))?;

        Self::issue_tokens(&state, user).await
    }

    pub async fn me(state: AppState, user_id: Uuid) -> Result<UserResponse> {
        let user = AuthRepository::find_user_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| anyhow!("User not found"))?;
        Ok(user.into())
    }

    pub async fn logout(state: AppState, user_id: Uuid) -> Result<()> {
        let mut redis_conn = state.redis.get_conn().await?;
        AuthRepository::delete_refresh_token(&mut redis_conn, user_id).await?;
        Ok(())
    }

    pub async fn block_token(state: AppState, token: &str, ttl_seconds: u64) -> Result<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let mut redis_conn = state.redis.get_conn().await?;
        AuthRepository::block_access_token(&mut redis_conn, token, ttl_seconds).await
    }

    /// Validates the stored refresh token and rotates it.
    pub async fn refresh_access(state: AppState, refresh_token: &str) -> Result<(AuthResponse, String)> {
        let user_id = parse_refresh_token(refresh_token)?;
        let mut redis_conn = state.redis.get_conn().await?;

        match AuthRepository::get_refresh_token(&mut redis_conn, user_id).await? {
            Some(stored) if stored == refresh_token => {}
            Some(_) => return Err(anyhow!("Invalid refresh token")),
            None => return Err(anyhow!("Refresh token expired or invalid")),
        }

        let user = AuthRepository::find_user_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| anyhow!("User not found"))?;

        Self::issue_tokens(&state, user).await
    }

    async fn issue_tokens(state: &AppState, user: User) -> Result<(AuthResponse, String)> {
        let access_token = create_access_token(&state.config.jwt_secret, user.id, user.role)?;
        let refresh_token = format!("{}:{}", user.id, Uuid::new_v4());

        let mut redis_conn = state.redis.get_conn().await?;
        AuthRepository::store_refresh_token(&mut redis_conn, user.id, &refresh_token, REFRESH_TOKEN_TTL_SECS)
            .await?;

        Ok((
            AuthResponse {
                access_token,
                access_token_expires_in: ACCESS_TOKEN_TTL_SECS,
                refresh_token_expires_in: REFRESH_TOKEN_TTL_SECS,
                user: user.into(),
            },
            refresh_token,
        ))
    }
}

/// Refresh tokens have the form `user_id:random_uuid`.
pub fn parse_refresh_token(token: &str) -> Result<Uuid> {
    let (user_id, nonce) = token
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid token format"))?;
    Uuid::parse_str(nonce).map_err(|_| anyhow!("Invalid token format"))?;
    Uuid::parse_str(user_id).map_err(|_| anyhow!("Invalid user ID in token"))
}

pub fn create_access_token(secret: &str, user_id: Uuid, role: UserRole) -> Result<String> {
    let now = get_current_timestamp();
    let claims = TokenClaims {
        sub: user_id,
        role: role.to_string(),
        exp: (now + ACCESS_TOKEN_TTL_SECS) as usize,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!(e.to_string()))
}
