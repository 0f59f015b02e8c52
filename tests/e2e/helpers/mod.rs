use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use replygate_backend::domain::auth::JwtManager;
use replygate_backend::domain::reply::{
    ExtractionError, GenerationError, ImageSource, ReplyGenerator, ReplyStyle, TextExtractor,
};
use replygate_backend::domain::usage::FixedDateProvider;
use replygate_backend::infrastructure::config::{Config, Environment, LogFormat};
use replygate_backend::infrastructure::repositories::CachedTierResolver;
use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio::net::TcpListener;
use uuid::Uuid;

pub mod api_client;

use api_client::TestClient;
use db_pool::{DatabasePool, LeasedDatabase};
use fixtures::TestFixtures;

// Docker client for test containers
static DOCKER: Lazy<Cli> = Lazy::new(Cli::default);

// Shared PostgreSQL container for all tests
static SHARED_CONTAINER: Lazy<SharedContainer> = Lazy::new(SharedContainer::new);

static DB_POOL: Lazy<DatabasePool> = Lazy::new(|| DatabasePool::new(SHARED_CONTAINER.port));

struct SharedContainer {
    _container: Container<'static, Postgres>,
    port: u16,
}

impl SharedContainer {
    fn new() -> Self {
        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        println!("🐳 Started shared PostgreSQL container on port {}", port);

        Self {
            _container: container,
            port,
        }
    }
}

/// Reply generator that answers deterministically and can be told to fail
#[derive(Default)]
pub struct StubReplyGenerator {
    failing: AtomicBool,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl StubReplyGenerator {
    pub fn fail_next_calls(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplyGenerator for StubReplyGenerator {
    async fn generate_reply(
        &self,
        text: &str,
        style: ReplyStyle,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(GenerationError::Upstream("model overloaded".to_string()));
        }
        Ok(format!("{} reply to: {}", style, text))
    }
}

/// Reads a fixed chat out of any URL; base64 payloads contain no text
pub struct StubTextExtractor;

#[async_trait]
impl TextExtractor for StubTextExtractor {
    async fn extract_text(&self, image: &ImageSource) -> Result<String, ExtractionError> {
        match image {
            ImageSource::Url(_) => Ok("  are you\n\n free tonight? ".to_string()),
            ImageSource::Base64(_) => Err(ExtractionError::Empty),
        }
    }
}

pub struct TestContext {
    pub client: TestClient,
    pub pool: PgPool,
    pub config: Config,
    pub fixtures: TestFixtures,
    pub generator: Arc<StubReplyGenerator>,
    pub clock: Arc<FixedDateProvider>,
    pub tiers: Arc<CachedTierResolver>,
    pub today: NaiveDate,
    db: LeasedDatabase,
    _guest_dir: TempDir,
}

#[allow(dead_code)]
impl TestContext {
    pub fn token_for(&self, user_id: Uuid) -> String {
        generate_test_jwt(&user_id, &self.config.jwt_secret)
    }

    /// Move the server's calendar forward
    pub fn advance_days(&self, days: u64) -> NaiveDate {
        let next = self.today + chrono::Days::new(days);
        self.clock.set(next);
        next
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let leased = DB_POOL
                .lease()
                .await
                .expect("Failed to get database from pool");

            let guest_dir = TempDir::new().expect("Failed to create guest data dir");

            let config = Config {
                database_url: leased.database_url.clone(),
                host: "127.0.0.1".to_string(),
                port: 0,
                jwt_secret: "test-jwt-secret-key-for-testing-only".to_string(),
                jwt_expiration_hours: 1,
                environment: Environment::Development,
                log_format: LogFormat::Pretty,
                openai_api_key: "test-openai-key".to_string(),
                openai_model: "test-model".to_string(),
                ocr_api_url: "http://127.0.0.1:9/parse/image".to_string(),
                ocr_api_key: "test-ocr-key".to_string(),
                guest_data_dir: guest_dir.path().to_path_buf(),
                upstream_timeout_secs: 5,
                tier_cache_enabled: true,
                commit_retry_attempts: 1,
            };

            let today = Local::now().date_naive();
            let clock = Arc::new(FixedDateProvider::new(today));
            let generator = Arc::new(StubReplyGenerator::default());

            let (app, tiers) = create_app_with_stubs(
                config.clone(),
                leased.pool.clone(),
                generator.clone(),
                clock.clone(),
            )
            .expect("Failed to create app");

            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

            let client = TestClient::new(&base_url);
            let fixtures = TestFixtures::new(leased.pool.clone(), today);

            Self {
                client,
                pool: leased.pool.clone(),
                config,
                fixtures,
                generator,
                clock,
                tiers,
                today,
                db: leased,
                _guest_dir: guest_dir,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async move {
            DB_POOL.release(self.db).await;
        }
    }
}

/// Same wiring as `main`, with stubbed upstreams, guest files under a
/// per-test temp dir and a settable clock
fn create_app_with_stubs(
    config: Config,
    pool: PgPool,
    generator: Arc<StubReplyGenerator>,
    clock: Arc<FixedDateProvider>,
) -> Result<(Router, Arc<CachedTierResolver>)> {
    use replygate_backend::{
        controllers::{history::HistoryController, reply::ReplyController, usage::UsageController},
        domain::{
            history::HistoryService, quota::QuotaLedger, reply::ReplySessionService,
            usage::UsagePolicy,
        },
        infrastructure::{
            http::build_router,
            repositories::{
                AccountQuotaStore, GuestHistoryStore, GuestQuotaStore, HistoryRepository,
                UserRepository,
            },
            storage::{FileKeyValueStore, KeyValueStore},
        },
    };

    let pool = Arc::new(pool);
    let config = Arc::new(config);
    let policy = UsagePolicy::default();

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
    let tiers = Arc::new(CachedTierResolver::new(
        user_repo.clone(),
        config.tier_cache_enabled,
    ));

    let reply_service = Arc::new(ReplySessionService::new(
        quota_ledger,
        policy,
        history_service.clone(),
        generator,
        Arc::new(StubTextExtractor),
        tiers.clone(),
        clock,
        config.upstream_timeout(),
    ));

    let reply_controller = Arc::new(ReplyController::new(
        reply_service.clone(),
        config.commit_retry_attempts,
    ));
    let usage_controller = Arc::new(UsageController::new(reply_service));
    let history_controller = Arc::new(HistoryController::new(history_service));

    let router = build_router(
        pool,
        config,
        user_repo,
        reply_controller,
        usage_controller,
        history_controller,
    );

    Ok((router, tiers))
}

pub fn generate_test_jwt(user_id: &Uuid, secret: &str) -> String {
    JwtManager::new(secret.to_string(), 1)
        .generate_token(*user_id, "test@example.com")
        .unwrap()
}

pub fn unique_device_id() -> String {
    format!("device-{}", Uuid::new_v4().simple())
}
