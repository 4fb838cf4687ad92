use crate::cache::CacheService;
use crate::error::AppError;
use crate::models::Booking;
use crate::seat_status::{SeatId, SeatStatus};
use crate::shifts::Shift;
use redis::AsyncCommands;
use tracing::{info, warn};

const SEAT_STATUS_KEY: &str = "seat_status";

// Снимаем удержание, только если оно всё ещё наше
const RELEASE_HOLD_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

fn hold_key(seat_id: SeatId, shift: Shift) -> String {
    format!("seat:{}:hold:{:?}", seat_id, shift)
}

// Ответы пайплайна идут в том же порядке, что и `candidates`
fn held_by_others(
    candidates: &[Shift],
    holders: Vec<Option<String>>,
    own_token: Option<&str>,
) -> Vec<Shift> {
    candidates
        .iter()
        .zip(holders)
        .filter_map(|(&candidate, holder)| match holder {
            Some(holder) if Some(holder.as_str()) != own_token => Some(candidate),
            _ => None,
        })
        .collect()
}

impl CacheService {
    /// Карта статусов мест: сначала кеш, при промахе или ошибке Redis - БД.
    pub async fn get_seat_status(&self) -> Result<SeatStatus, AppError> {
        if self.enabled {
            match self.get_seat_status_from_cache().await {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => warn!("Seat status cache read failed, falling back to DB: {}", e),
            }
        }

        let status = Booking::load_seat_status(&self.db.pool).await?;

        if self.enabled {
            if let Err(e) = self.save_seat_status_to_cache(&status).await {
                warn!("Failed to cache seat status: {}", e);
            }
        }
        Ok(status)
    }

    // Инвалидировать кеш после любой записи в bookings
    pub async fn invalidate_seat_status(&self) {
        if !self.enabled {
            return;
        }
        let mut conn = self.redis.conn.clone();
        let result: Result<(), _> = conn.del(SEAT_STATUS_KEY).await;
        match result {
            Ok(()) => info!("Invalidated seat status cache"),
            Err(e) => warn!("Failed to invalidate seat status cache: {}", e),
        }
    }

    /// Атомарно удержать место на смену. `false`, если удержание уже есть.
    pub async fn place_hold(
        &self,
        seat_id: SeatId,
        shift: Shift,
        token: &str,
    ) -> Result<bool, redis::RedisError> {
        let mut conn = self.redis.conn.clone();

        // SET NX EX - атомарная операция без гонок
        let result: Option<String> = redis::cmd("SET")
            .arg(hold_key(seat_id, shift))
            .arg(token)
            .arg("NX")
            .arg("EX")
            .arg(self.hold_ttl)
            .query_async(&mut conn)
            .await?;

        Ok(result.is_some())
    }

    /// Смены, конфликтующие с `shift`, на которых место удерживает кто-то другой.
    pub async fn foreign_holds(
        &self,
        seat_id: SeatId,
        shift: Shift,
        own_token: Option<&str>,
    ) -> Result<Vec<Shift>, redis::RedisError> {
        let candidates = shift.overlapping();
        let mut conn = self.redis.conn.clone();
        let mut pipe = redis::pipe();

        for &candidate in candidates {
            pipe.get(hold_key(seat_id, candidate));
        }

        let holders: Vec<Option<String>> = pipe.query_async(&mut conn).await?;

        Ok(held_by_others(candidates, holders, own_token))
    }

    pub async fn release_hold(
        &self,
        seat_id: SeatId,
        shift: Shift,
        token: &str,
    ) -> Result<bool, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let removed: i64 = redis::Script::new(RELEASE_HOLD_SCRIPT)
            .key(hold_key(seat_id, shift))
            .arg(token)
            .invoke_async(&mut conn)
            .await?;
        Ok(removed == 1)
    }

    // === Работа с кешем ===

    async fn get_seat_status_from_cache(&self) -> Result<Option<SeatStatus>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(SEAT_STATUS_KEY).await?;
        data.map(|data| {
            serde_json::from_str(&data).map_err(|_| {
                redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
            })
        })
        .transpose()
    }

    async fn save_seat_status_to_cache(&self, status: &SeatStatus) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(status).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(SEAT_STATUS_KEY, data, self.seat_status_ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_keys_are_per_seat_and_shift() {
        assert_eq!(hold_key(7, Shift::FullDay), "seat:7:hold:FullDay");
        assert_ne!(hold_key(7, Shift::Day), hold_key(7, Shift::Late));
    }

    #[test]
    fn own_hold_does_not_count_as_foreign() {
        let candidates = Shift::Morning.overlapping();
        let holders = vec![Some("mine".to_string()), None, Some("theirs".to_string())];
        assert_eq!(
            held_by_others(candidates, holders.clone(), Some("mine")),
            vec![candidates[2]]
        );
        // Без токена любое удержание чужое
        assert_eq!(held_by_others(candidates, holders, None), vec![candidates[0], candidates[2]]);
    }

    #[test]
    fn free_shifts_are_not_held() {
        let candidates = Shift::FullDay.overlapping();
        let holders = vec![None; candidates.len()];
        assert!(held_by_others(candidates, holders, Some("mine")).is_empty());
    }
}
