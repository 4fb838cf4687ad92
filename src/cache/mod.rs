use crate::{config::Config, database::Database, redis_client::RedisClient};
use tracing::{info, warn};

pub mod auth;
pub mod seats;

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    db: Database,
    enabled: bool,
    seat_status_ttl: u64,
    hold_ttl: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, db: Database, config: &Config) -> Self {
        Self {
            redis,
            db,
            enabled: config.features.enable_cache,
            seat_status_ttl: config.redis.seat_status_ttl_seconds,
            hold_ttl: config.redis.seat_hold_ttl_seconds,
        }
    }

    pub fn hold_ttl(&self) -> u64 {
        self.hold_ttl
    }

    // Прогрев кеша при старте
    pub async fn warmup_cache(&self) {
        if !self.enabled {
            info!("Seat status cache disabled, skipping warmup");
            return;
        }

        info!("Starting cache warmup...");
        match self.get_seat_status().await {
            Ok(status) => info!("Loaded status for {} seats", status.len()),
            Err(e) => warn!("Cache warmup failed: {}", e),
        }
        info!("Cache warmup done");
    }
}
