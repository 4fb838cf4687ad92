use crate::cache::CacheService;
use redis::AsyncCommands;

const AUTH_TTL_SECONDS: u64 = 900;

impl CacheService {
    /// Сохранить данные проверенного администратора в кеш
    pub async fn cache_admin(
        &self,
        email: &str,
        fingerprint: &str,
        admin_data: &str, // JSON сериализованный AdminUser
    ) -> Result<(), redis::RedisError> {
        let key = format!("auth:{}:{}", email, fingerprint);
        let mut conn = self.redis.conn.clone();
        conn.set_ex(key, admin_data, AUTH_TTL_SECONDS).await
    }

    /// Получить данные администратора из кеша авторизации
    pub async fn get_cached_admin(
        &self,
        email: &str,
        fingerprint: &str,
    ) -> Result<Option<String>, redis::RedisError> {
        let key = format!("auth:{}:{}", email, fingerprint);
        let mut conn = self.redis.conn.clone();
        conn.get(key).await
    }
}
