use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub label: String,
    pub is_active: bool,
}

impl Seat {
    pub async fn list_active<'e, E: PgExecutor<'e>>(exec: E) -> Result<Vec<Seat>, sqlx::Error> {
        sqlx::query_as::<_, Seat>(
            "SELECT id, label, is_active FROM seats WHERE is_active ORDER BY id",
        )
        .fetch_all(exec)
        .await
    }

    // Блокируем строку места до конца транзакции, чтобы брони одного места шли по очереди
    pub async fn lock_for_update<'e, E: PgExecutor<'e>>(
        exec: E,
        seat_id: i64,
    ) -> Result<Option<Seat>, sqlx::Error> {
        sqlx::query_as::<_, Seat>(
            "SELECT id, label, is_active FROM seats WHERE id = $1 AND is_active FOR UPDATE",
        )
        .bind(seat_id)
        .fetch_optional(exec)
        .await
    }
}
