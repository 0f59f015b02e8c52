use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;
use crate::{
    controllers::{
        health, history::HistoryController, reply::ReplyController, usage::UsageController,
    },
    infrastructure::auth::{caller_middleware, request_id_middleware},
};

use crate::infrastructure::repositories::UserRepository;

/// Assemble every route with its middleware
pub fn build_router(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    user_repo: Arc<UserRepository>,
    reply_controller: Arc<ReplyController>,
    usage_controller: Arc<UsageController>,
    history_controller: Arc<HistoryController>,
) -> Router {
    // Every metered route needs a caller, account or guest
    let caller_layer = middleware::from_fn_with_state((user_repo, config), caller_middleware);

    let reply_routes = Router::new()
        .route("/api/replies", post(ReplyController::create_reply))
        .with_state(reply_controller)
        .layer(caller_layer.clone());

    let usage_routes = Router::new()
        .route("/api/usage", get(UsageController::get_usage))
        .with_state(usage_controller)
        .layer(caller_layer.clone());

    let history_routes = Router::new()
        .route("/api/history", get(HistoryController::list_history))
        .route("/api/history/:entryId", delete(HistoryController::delete_entry))
        .with_state(history_controller)
        .layer(caller_layer);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool)
        .merge(reply_routes)
        .merge(usage_routes)
        .merge(history_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(CorsLayer::permissive()),
        )
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
