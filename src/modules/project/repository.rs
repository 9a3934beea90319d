use super::dto::UpdateProjectRequest;
use super::model::Project;
use crate::modules::generation::guard::ProjectOwnership;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const PROJECT_COLUMNS: &str = "id, user_id, title, description, status, music_url, video_url, \
    thumbnail_url, created_at, updated_at";

pub struct ProjectRepository;

impl ProjectRepository {
    pub async fn create(pool: &PgPool, user_id: Uuid, title: &str, description: Option<&str>) -> Result<Project> {
        let sql = format!(
            "INSERT INTO projects (user_id, title, description, status) \
             VALUES ($1, $2, $3, 'draft') RETURNING {PROJECT_COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(user_id)
            .bind(title)
            .bind(description)
            .fetch_one(pool)
            .await
            .map_err(|e| anyhow!("Failed to create project: {}", e))
    }

    pub async fn find_all_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Project>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| anyhow!("Failed to fetch projects: {}", e))
    }

    pub async fn find_for_user(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| anyhow!("Failed to fetch project: {}", e))
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        req: UpdateProjectRequest,
    ) -> Result<Option<Project>> {
        let sql = format!(
            r#"
            UPDATE projects
            SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                music_url = COALESCE($6, music_url),
                video_url = COALESCE($7, video_url),
                thumbnail_url = COALESCE($8, thumbnail_url),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {PROJECT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(req.title)
            .bind(req.description)
            .bind(req.status)
            .bind(req.music_url)
            .bind(req.video_url)
            .bind(req.thumbnail_url)
            .fetch_optional(pool)
            .await
            .map_err(|e| anyhow!("Failed to update project: {}", e))
    }

    pub async fn count_jobs(pool: &PgPool, id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM generation_jobs WHERE project_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Returns false when no project with that id belongs to the user.
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Ownership lookups for the job access guard.
#[derive(Clone)]
pub struct PgProjectOwnership {
    pool: PgPool,
}

impl PgProjectOwnership {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectOwnership for PgProjectOwnership {
    async fn owner_of(&self, project_id: Uuid) -> Result<Option<Uuid>> {
        let owner = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM projects WHERE id = $1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }
}
