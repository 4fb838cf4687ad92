use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use tracing::error;

use crate::error::AppError;
use crate::seat_status::{BookingStatus, SeatShiftStatus, SeatStatus};
use crate::shifts::Shift;

const BOOKING_COLUMNS: &str =
    "id, seat_id, shift, status, student_name, phone, created_at, updated_at";

// Строка как она лежит в БД, смена и статус ещё строками
#[derive(Debug, FromRow)]
struct BookingRow {
    id: i64,
    seat_id: i64,
    shift: String,
    status: String,
    student_name: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: i64,
    pub seat_id: i64,
    pub shift: Shift,
    pub status: BookingStatus,
    pub student_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let shift = row
            .shift
            .parse()
            .map_err(|e| AppError::Internal(format!("booking {}: {e}", row.id)))?;
        let status = row
            .status
            .parse()
            .map_err(|e| AppError::Internal(format!("booking {}: {e}", row.id)))?;
        Ok(Booking {
            id: row.id,
            seat_id: row.seat_id,
            shift,
            status,
            student_name: row.student_name,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub seat_id: i64,
    pub shift: Shift,
    pub student_name: String,
    pub phone: Option<String>,
}

impl Booking {
    pub async fn find<'e, E: PgExecutor<'e>>(exec: E, id: i64) -> Result<Option<Booking>, AppError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(exec)
        .await?;
        row.map(Booking::try_from).transpose()
    }

    pub async fn lock_for_update<'e, E: PgExecutor<'e>>(
        exec: E,
        id: i64,
    ) -> Result<Option<Booking>, AppError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(exec)
        .await?;
        row.map(Booking::try_from).transpose()
    }

    pub async fn list<'e, E: PgExecutor<'e>>(
        exec: E,
        seat_id: Option<i64>,
    ) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE ($1::BIGINT IS NULL OR seat_id = $1)
             ORDER BY seat_id, updated_at DESC, id DESC"
        ))
        .bind(seat_id)
        .fetch_all(exec)
        .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    pub async fn insert<'e, E: PgExecutor<'e>>(
        exec: E,
        new: &NewBooking,
    ) -> Result<Booking, AppError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "INSERT INTO bookings (seat_id, shift, status, student_name, phone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(new.seat_id)
        .bind(new.shift.label())
        .bind(BookingStatus::Unpaid.as_str())
        .bind(&new.student_name)
        .bind(&new.phone)
        .fetch_one(exec)
        .await?;
        row.try_into()
    }

    pub async fn set_status<'e, E: PgExecutor<'e>>(
        exec: E,
        id: i64,
        status: BookingStatus,
    ) -> Result<Booking, AppError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_one(exec)
        .await?;
        row.try_into()
    }

    /// Статусы по сменам для одного места. `exclude` исключает бронь,
    /// которую сейчас переводим в другой статус.
    pub async fn seat_record<'e, E: PgExecutor<'e>>(
        exec: E,
        seat_id: i64,
        exclude: Option<i64>,
    ) -> Result<SeatShiftStatus, AppError> {
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, shift, status FROM bookings WHERE seat_id = $1")
                .bind(seat_id)
                .fetch_all(exec)
                .await?;

        Ok(record_excluding(seat_id, rows, exclude))
    }

    /// Собирает карту статусов всех активных мест. Место без броней попадает
    /// в карту с пустой записью. Из нескольких броней на одну смену берётся
    /// самый сильный статус (`Confirmed` > `Paid` > `discontinue` > `Unpaid`).
    pub async fn load_seat_status<'e, E: PgExecutor<'e>>(exec: E) -> Result<SeatStatus, AppError> {
        let rows: Vec<(i64, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT s.id, b.shift, b.status
             FROM seats s
             LEFT JOIN bookings b ON b.seat_id = s.id
             WHERE s.is_active
             ORDER BY s.id",
        )
        .fetch_all(exec)
        .await?;

        let mut status = SeatStatus::new();
        for (seat_id, shift, booking_status) in rows {
            let record = status.entry(seat_id);
            if let (Some(shift), Some(booking_status)) = (shift, booking_status) {
                if let Some((shift, booking_status)) = parse_pair(seat_id, &shift, &booking_status) {
                    record.record(shift, booking_status);
                }
            }
        }
        Ok(status)
    }
}

/// Сворачивает строки `(id, смена, статус)` одного места в запись по сменам,
/// пропуская бронь `exclude`.
pub fn record_excluding<I>(seat_id: i64, rows: I, exclude: Option<i64>) -> SeatShiftStatus
where
    I: IntoIterator<Item = (i64, String, String)>,
{
    rows.into_iter()
        .filter(|(id, _, _)| Some(*id) != exclude)
        .filter_map(|(_, shift, status)| parse_pair(seat_id, &shift, &status))
        .collect()
}

// В БД стоят CHECK-ограничения, так что сюда попадаем только при ручной правке
fn parse_pair(seat_id: i64, shift: &str, status: &str) -> Option<(Shift, BookingStatus)> {
    match (shift.parse::<Shift>(), status.parse::<BookingStatus>()) {
        (Ok(shift), Ok(status)) => Some((shift, status)),
        (Err(e), _) => {
            error!("Skipping booking row for seat {}: {}", seat_id, e);
            None
        }
        (_, Err(e)) => {
            error!("Skipping booking row for seat {}: {}", seat_id, e);
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub booking_id: i64,
    pub old_status: Option<String>,
    pub new_status: String,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

impl AuditEntry {
    pub async fn record<'e, E: PgExecutor<'e>>(
        exec: E,
        booking_id: i64,
        old_status: Option<BookingStatus>,
        new_status: BookingStatus,
        changed_by: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO booking_audit (booking_id, old_status, new_status, changed_by)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(booking_id)
        .bind(old_status.map(BookingStatus::as_str))
        .bind(new_status.as_str())
        .bind(changed_by)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn for_booking<'e, E: PgExecutor<'e>>(
        exec: E,
        booking_id: i64,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        sqlx::query_as::<_, AuditEntry>(
            "SELECT id, booking_id, old_status, new_status, changed_by, changed_at
             FROM booking_audit
             WHERE booking_id = $1
             ORDER BY changed_at, id",
        )
        .bind(booking_id)
        .fetch_all(exec)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seat_status::admit;

    fn row(id: i64, shift: Shift, status: &str) -> (i64, String, String) {
        (id, shift.label().to_string(), status.to_string())
    }

    #[test]
    fn paid_booking_survives_later_unpaid_one() {
        // 1 оплачена раньше, 2 создана позже и не оплачена
        let rows = vec![
            row(1, Shift::Morning, "Paid"),
            row(2, Shift::Morning, "Unpaid"),
        ];
        let record = record_excluding(7, rows, None);
        assert_eq!(record.get(Shift::Morning), BookingStatus::Paid);
        assert!(admit(&record, Shift::Morning).is_err());
        assert!(admit(&record, Shift::FullDay).is_err());
    }

    #[test]
    fn confirmed_is_not_overridden() {
        let rows = vec![
            row(1, Shift::FullDay, "Confirmed"),
            row(2, Shift::FullDay, "Paid"),
            row(3, Shift::FullDay, "discontinue"),
        ];
        let record = record_excluding(7, rows, None);
        assert_eq!(record.get(Shift::FullDay), BookingStatus::Confirmed);
    }

    #[test]
    fn excluded_booking_does_not_block_itself() {
        let rows = vec![row(1, Shift::Morning, "Paid")];
        let record = record_excluding(7, rows.clone(), Some(1));
        assert!(admit(&record, Shift::Morning).is_ok());

        // Другая оплаченная бронь на ту же смену всё ещё мешает
        let mut rows = rows;
        rows.push(row(2, Shift::Morning, "Unpaid"));
        rows.push(row(3, Shift::Morning, "Paid"));
        let record = record_excluding(7, rows, Some(2));
        assert!(admit(&record, Shift::Morning).is_err());
    }

    #[test]
    fn bad_rows_are_skipped() {
        let rows = vec![
            (1, "Brunch".to_string(), "Paid".to_string()),
            row(2, Shift::FullDay, "Refunded"),
        ];
        let record = record_excluding(7, rows, None);
        assert_eq!(record.iter().count(), 0);
    }
}
