use redis::{aio::MultiplexedConnection, Client};
use tracing::info;

use crate::config::{redact_url, RedisConfig};

/// Соединение с Redis под кеш статусов мест и удержания.
/// Клон делит одно мультиплексированное соединение.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn connect(config: &RedisConfig) -> redis::RedisResult<Self> {
        info!("Connecting to Redis at {}", redact_url(&config.url));
        let conn = Client::open(config.url.as_str())?
            .get_multiplexed_async_connection()
            .await?;
        Ok(RedisClient { conn })
    }

    /// Для /health
    pub async fn ping(&self) -> redis::RedisResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
