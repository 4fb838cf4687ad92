use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AuditEntry, Booking, NewBooking, Seat};
use crate::seat_status::{
    admit, blocking_shifts, seat_state, AdmissionError, BookingStatus, SeatId, SeatShiftStatus,
    SeatState,
};
use crate::shifts::Shift;
use crate::AppState;

/// Результат проверки места на смену.
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub seat_id: SeatId,
    pub shift: Shift,
    pub available: bool,
    pub state: SeatState,
    pub color: &'static str,
    pub blocking: Vec<Shift>,
    pub held: Vec<Shift>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HoldGrant {
    pub seat_id: SeatId,
    pub shift: Shift,
    pub hold_token: String,
    pub expires_in: u64,
}

pub struct BookingService {
    state: Arc<AppState>,
}

impl BookingService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Проверка допуска без записи: по кешу статусов и удержаниям.
    pub async fn check(&self, seat_id: SeatId, shift: Shift) -> Result<Availability, AppError> {
        let status = self.state.cache.get_seat_status().await?;
        let record = status
            .get(seat_id)
            .ok_or_else(|| AppError::NotFound(format!("seat {seat_id} not found")))?;

        let state = seat_state(Some(record), shift);
        let blocking = blocking_shifts(record, shift);
        let held = self.state.cache.foreign_holds(seat_id, shift, None).await?;

        Ok(Availability {
            seat_id,
            shift,
            available: blocking.is_empty() && held.is_empty(),
            state,
            color: state.color(),
            blocking,
            held,
        })
    }

    /// Удержать место на время оформления брони.
    pub async fn hold(&self, seat_id: SeatId, shift: Shift) -> Result<HoldGrant, AppError> {
        let availability = self.check(seat_id, shift).await?;
        if !availability.blocking.is_empty() {
            let refusal = AdmissionError::Overlap {
                requested: shift,
                blocking: availability.blocking,
            };
            warn!("Hold refused for seat {}: {}", seat_id, refusal);
            return Err(refusal.into());
        }
        if !availability.held.is_empty() {
            return Err(AppError::Conflict(format!(
                "seat {seat_id} is being booked by someone else"
            )));
        }

        let token = Uuid::new_v4().to_string();
        if !self.state.cache.place_hold(seat_id, shift, &token).await? {
            return Err(AppError::Conflict(format!(
                "seat {seat_id} is being booked by someone else"
            )));
        }

        info!("Seat {} held for shift {}", seat_id, shift);
        Ok(HoldGrant {
            seat_id,
            shift,
            hold_token: token,
            expires_in: self.state.cache.hold_ttl(),
        })
    }

    /// Создать бронь со статусом `Unpaid` после проверки допуска.
    pub async fn create(
        &self,
        new: NewBooking,
        hold_token: Option<&str>,
    ) -> Result<Booking, AppError> {
        // Redis опрашиваем до блокировки строки места
        let held = self
            .state
            .cache
            .foreign_holds(new.seat_id, new.shift, hold_token)
            .await?;
        if !held.is_empty() {
            return Err(AppError::Conflict(format!(
                "seat {} is being booked by someone else",
                new.seat_id
            )));
        }

        let mut tx = self.state.db.pool.begin().await?;

        Seat::lock_for_update(&mut *tx, new.seat_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("seat {} not found", new.seat_id)))?;

        let record = Booking::seat_record(&mut *tx, new.seat_id, None).await?;
        admit_or_log(&record, new.seat_id, new.shift)?;

        let booking = Booking::insert(&mut *tx, &new).await?;
        AuditEntry::record(&mut *tx, booking.id, None, booking.status, "public").await?;
        tx.commit().await?;

        if let Some(token) = hold_token {
            if let Err(e) = self.state.cache.release_hold(new.seat_id, new.shift, token).await {
                // Не критично: удержание истечёт само
                warn!("Failed to release hold on seat {}: {}", new.seat_id, e);
            }
        }
        self.state.cache.invalidate_seat_status().await;

        info!(
            "Booking {} created: seat {} shift {}",
            booking.id, booking.seat_id, booking.shift
        );
        Ok(booking)
    }

    /// Перевести бронь в новый статус. Переход в `Paid`/`Confirmed` заново
    /// проверяет допуск без учёта самой брони.
    pub async fn update_status(
        &self,
        booking_id: i64,
        status: BookingStatus,
        changed_by: &str,
    ) -> Result<Booking, AppError> {
        let mut tx = self.state.db.pool.begin().await?;

        let current = Booking::lock_for_update(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        match plan_transition(current.status, status) {
            StatusTransition::Unchanged => return Ok(current),
            StatusTransition::Readmit => {
                Seat::lock_for_update(&mut *tx, current.seat_id).await?;
                let record =
                    Booking::seat_record(&mut *tx, current.seat_id, Some(booking_id)).await?;
                admit_or_log(&record, current.seat_id, current.shift)?;
            }
            StatusTransition::Apply => {}
        }

        let updated = Booking::set_status(&mut *tx, booking_id, status).await?;
        AuditEntry::record(&mut *tx, booking_id, Some(current.status), status, changed_by).await?;
        tx.commit().await?;

        self.state.cache.invalidate_seat_status().await;

        info!(
            "Booking {} status {} -> {} by {}",
            booking_id, current.status, status, changed_by
        );
        Ok(updated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// Статус тот же, писать нечего
    Unchanged,
    /// Бронь начинает занимать место: сначала проверить допуск
    Readmit,
    Apply,
}

pub fn plan_transition(current: BookingStatus, next: BookingStatus) -> StatusTransition {
    if current == next {
        StatusTransition::Unchanged
    } else if next.blocks_admission() && !current.blocks_admission() {
        StatusTransition::Readmit
    } else {
        StatusTransition::Apply
    }
}

fn admit_or_log(record: &SeatShiftStatus, seat_id: SeatId, shift: Shift) -> Result<(), AppError> {
    admit(record, shift).map_err(|e| {
        warn!("Admission refused for seat {}: {}", seat_id, e);
        AppError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::record_excluding;
    use BookingStatus::*;

    #[test]
    fn same_status_is_a_no_op() {
        for st in [Unpaid, Paid, Confirmed, Discontinued] {
            assert_eq!(plan_transition(st, st), StatusTransition::Unchanged);
        }
    }

    #[test]
    fn promotion_to_blocking_status_readmits() {
        for from in [Unpaid, Discontinued] {
            for to in [Paid, Confirmed] {
                assert_eq!(plan_transition(from, to), StatusTransition::Readmit, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn already_blocking_or_releasing_skips_admission() {
        assert_eq!(plan_transition(Paid, Confirmed), StatusTransition::Apply);
        assert_eq!(plan_transition(Confirmed, Paid), StatusTransition::Apply);
        assert_eq!(plan_transition(Paid, Unpaid), StatusTransition::Apply);
        assert_eq!(plan_transition(Confirmed, Discontinued), StatusTransition::Apply);
        assert_eq!(plan_transition(Unpaid, Discontinued), StatusTransition::Apply);
    }

    #[test]
    fn readmission_sees_other_paid_booking_on_same_shift() {
        let rows = || {
            vec![
                (1, Shift::Morning.label().to_string(), "Unpaid".to_string()),
                (2, Shift::Morning.label().to_string(), "Paid".to_string()),
            ]
        };
        // Бронь 1 переводят в Paid, а смену уже держит бронь 2
        assert_eq!(plan_transition(Unpaid, Paid), StatusTransition::Readmit);
        let record = record_excluding(3, rows(), Some(1));
        assert!(admit_or_log(&record, 3, Shift::Morning).is_err());

        // Сама бронь 2 себе не мешает
        let record = record_excluding(3, rows(), Some(2));
        assert!(admit_or_log(&record, 3, Shift::Morning).is_ok());
    }
}
