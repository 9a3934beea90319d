use crate::modules::auth::model::User;
use anyhow::Result;
use redis::AsyncCommands;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, name, password_hash, role, plan, credits, created_at, updated_at";

pub struct AuthRepository;

impl AuthRepository {
    pub async fn create_user(
        pool: &PgPool,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .fetch_one(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn store_refresh_token(
        redis: &mut redis::aio::MultiplexedConnection,
        user_id: Uuid,
        refresh_token: &str,
        ttl_seconds: u64,
    ) -> Result<()> {
        let key = format!("refresh_token:{}", user_id);
        let _: () = redis.set_ex(key, refresh_token, ttl_seconds).await?;
        Ok(())
    }

    pub async fn get_refresh_token(
        redis: &mut redis::aio::MultiplexedConnection,
        user_id: Uuid,
    ) -> Result<Option<String>> {
        let key = format!("refresh_token:{}", user_id);
        let token: Option<String> = redis.get(key).await?;
        Ok(token)
    }

    pub async fn delete_refresh_token(
        redis: &mut redis::aio::MultiplexedConnection,
        user_id: Uuid,
    ) -> Result<()> {
        let key = format!("refresh_token:{}", user_id);
        let _: () = redis.del(key).await?;
        Ok(())
    }

    pub async fn block_access_token(
        redis: &mut redis::aio::MultiplexedConnection,
        token: &str,
        ttl_seconds: u64,
    ) -> Result<()> {
        let key = format!("blocked_token:{}", token);
        let _: () = redis.set_ex(key, "blocked", ttl_seconds).await?;
        Ok(())
    }
}
