pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod seat_status;
pub mod services;
pub mod shifts;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::sync::Arc;
use tokio::task;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub cache: cache::CacheService,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::connect(&config.database).await?;
        db.migrate().await?;

        let redis = redis_client::RedisClient::connect(&config.redis).await?;

        let cache = cache::CacheService::new(redis.clone(), db.clone(), &config);
        let state = Arc::new(Self {
            db,
            redis,
            cache,
            config,
        });

        let state_for_bg = state.clone();
        task::spawn(async move {
            // Warmup cache в фоне
            state_for_bg.cache.warmup_cache().await;
        });

        Ok(state)
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Library Seats API v1.0" }))
        .route("/health", get(health))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    if let Err(e) = state.db.ping().await {
        tracing::error!("Health check: database unavailable: {}", e);
        return (StatusCode::SERVICE_UNAVAILABLE, "DB DOWN");
    }
    if let Err(e) = state.redis.ping().await {
        tracing::error!("Health check: redis unavailable: {}", e);
        return (StatusCode::SERVICE_UNAVAILABLE, "REDIS DOWN");
    }
    (StatusCode::OK, "OK")
}
