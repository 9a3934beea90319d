use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::redis::client::RedisService;
use crate::modules::generation::service::JobOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub redis: RedisService,
    pub jobs: Arc<JobOrchestrator>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        redis: RedisService,
        jobs: Arc<JobOrchestrator>,
    ) -> Self {
        Self {
            config,
            db,
            redis,
            jobs,
        }
    }
}
