use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use studio_backend::app;
use studio_backend::config::settings::AppConfig;
use studio_backend::infrastructure::db::pool;
use studio_backend::infrastructure::providers;
use studio_backend::infrastructure::redis::client::RedisService;
use studio_backend::modules::generation::guard::AccessGuard;
use studio_backend::modules::generation::repository::PgJobStore;
use studio_backend::modules::generation::service::{JobOrchestrator, OrchestratorSettings};
use studio_backend::modules::integration::repository::PgCredentialSource;
use studio_backend::modules::project::repository::PgProjectOwnership;
use studio_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info")),
        )
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("missing required environment variable")?;

    let db = pool::connect_to_db(&config.database_url).await?;
    pool::run_migrations(&db).await?;
    let redis = RedisService::new(&config.redis_url).await?;

    let registry = providers::build_registry(&config.providers)?;
    let refresher = Arc::new(providers::build_refresher(&config.providers)?);
    let orchestrator = JobOrchestrator::new(
        Arc::new(PgJobStore::new(db.clone())),
        AccessGuard::new(Arc::new(PgProjectOwnership::new(db.clone()))),
        registry,
        Arc::new(PgCredentialSource::new(db.clone(), refresher)),
        OrchestratorSettings::from(&config.providers),
    );

    let port = config.server_port;
    let state = AppState::new(config, db, redis, Arc::new(orchestrator));
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
