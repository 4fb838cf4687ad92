use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::controllers::seats::SeatShiftRequest;
use crate::error::AppError;
use crate::middleware::AdminUser;
use crate::models::{AuditEntry, Booking, NewBooking};
use crate::seat_status::BookingStatus;
use crate::services::booking::BookingService;
use crate::shifts::Shift;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/check", post(check_booking))
        .route("/bookings/status", patch(update_booking_status))
        .route("/bookings/{id}/audit", get(booking_audit))
}

/* ---------- ADMISSION ---------- */

// POST /api/bookings/check
async fn check_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeatShiftRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let shift: Shift = req.shift.parse()?;

    let availability = BookingService::new(state).check(req.seat_id, shift).await?;
    Ok(Json(availability))
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
#[derive(Debug, Deserialize, Validate)]
struct CreateBookingRequest {
    #[validate(range(min = 1, message = "seat_id must be > 0"))]
    seat_id: i64,
    shift: String,
    #[validate(length(min = 1, max = 120, message = "student_name must be 1..120 characters"))]
    student_name: String,
    #[validate(length(min = 7, max = 20, message = "phone must be 7..20 characters"))]
    phone: Option<String>,
    hold_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateBookingResponse {
    id: i64,
    status: BookingStatus,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let shift: Shift = req.shift.parse()?;

    let new = NewBooking {
        seat_id: req.seat_id,
        shift,
        student_name: req.student_name.trim().to_string(),
        phone: req.phone,
    };

    let booking = BookingService::new(state)
        .create(new, req.hold_token.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            id: booking.id,
            status: booking.status,
        }),
    ))
}

// GET /api/bookings?seat_id=
#[derive(Debug, Deserialize)]
struct BookingsQuery {
    seat_id: Option<i64>,
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<BookingsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = Booking::list(&state.db.pool, params.seat_id).await?;
    Ok(Json(bookings))
}

// PATCH /api/bookings/status
#[derive(Debug, Deserialize, Validate)]
struct UpdateStatusRequest {
    #[validate(range(min = 1, message = "booking_id must be > 0"))]
    booking_id: i64,
    status: String,
}

async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let status: BookingStatus = req.status.parse()?;

    let booking = BookingService::new(state)
        .update_status(req.booking_id, status, &admin.email)
        .await?;
    Ok(Json(booking))
}

// GET /api/bookings/{id}/audit
async fn booking_audit(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if Booking::find(&state.db.pool, booking_id).await?.is_none() {
        return Err(AppError::NotFound(format!("booking {booking_id} not found")));
    }
    let entries = AuditEntry::for_booking(&state.db.pool, booking_id).await?;
    Ok(Json(entries))
}
