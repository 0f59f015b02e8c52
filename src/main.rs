use async_openai::{config::OpenAIConfig, Client};
use replygate_backend::controllers::{
    history::HistoryController, reply::ReplyController, usage::UsageController,
};
use replygate_backend::domain::history::HistoryService;
use replygate_backend::domain::quota::QuotaLedger;
use replygate_backend::domain::reply::ReplySessionService;
use replygate_backend::domain::usage::{LocalDateProvider, UsagePolicy};
use replygate_backend::infrastructure::config::{Config, LogFormat};
use replygate_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use replygate_backend::infrastructure::http::{build_router, start_http_server};
use replygate_backend::infrastructure::repositories::{
    AccountQuotaStore, CachedTierResolver, GuestHistoryStore, GuestQuotaStore, HistoryRepository,
    OcrSpaceRepository, OpenAiReplyRepository, UserRepository,
};
use replygate_backend::infrastructure::storage::{FileKeyValueStore, KeyValueStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    init_logging(&config);

    if config.is_development() {
        tracing::warn!("Running in development mode");
    }

    tracing::info!(
        "Starting ReplyGate Backend on {}:{}",
        config.host,
        config.port
    );

    let pool = create_pool(&config.database_url).await?;
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    tracing::info!(
        guest_data_dir = %config.guest_data_dir.display(),
        upstream_timeout_secs = config.upstream_timeout_secs,
        tier_cache_enabled = config.tier_cache_enabled,
        "Usage gating configured"
    );

    let pool = Arc::new(pool);
    let config = Arc::new(config);
    let policy = UsagePolicy::default();

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Storage and repositories
    let guest_storage: Arc<dyn KeyValueStore> =
        Arc::new(FileKeyValueStore::new(config.guest_data_dir.clone()));
    let user_repo = Arc::new(UserRepository::new(pool.clone()));

    let quota_ledger = Arc::new(QuotaLedger::new(
        Arc::new(GuestQuotaStore::new(guest_storage.clone())),
        Arc::new(AccountQuotaStore::new(user_repo.clone(), *policy.limits())),
    ));
    let history_service = Arc::new(HistoryService::new(
        Arc::new(GuestHistoryStore::new(guest_storage)),
        Arc::new(HistoryRepository::new(pool.clone())),
    ));

    // 2. Upstream collaborators
    let openai_client = Arc::new(Client::with_config(
        OpenAIConfig::new().with_api_key(config.openai_api_key.clone()),
    ));
    let generator = Arc::new(OpenAiReplyRepository::new(
        openai_client,
        config.openai_model.clone(),
    ));
    let extractor = Arc::new(OcrSpaceRepository::new(
        config.ocr_api_url.clone(),
        config.ocr_api_key.clone(),
        config.upstream_timeout(),
    )?);
    let tiers = Arc::new(CachedTierResolver::new(
        user_repo.clone(),
        config.tier_cache_enabled,
    ));

    // 3. Services
    let reply_service = Arc::new(ReplySessionService::new(
        quota_ledger,
        policy,
        history_service.clone(),
        generator,
        extractor,
        tiers,
        Arc::new(LocalDateProvider),
        config.upstream_timeout(),
    ));

    // 4. Controllers
    let reply_controller = Arc::new(ReplyController::new(
        reply_service.clone(),
        config.commit_retry_attempts,
    ));
    let usage_controller = Arc::new(UsageController::new(reply_service));
    let history_controller = Arc::new(HistoryController::new(history_service));

    let app = build_router(
        pool,
        config.clone(),
        user_repo,
        reply_controller,
        usage_controller,
        history_controller,
    );

    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "replygate_backend=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
