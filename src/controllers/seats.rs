use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::AppError;
use crate::models::Seat;
use crate::seat_status::SeatState;
use crate::services::booking::BookingService;
use crate::shifts::Shift;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(get_seat_map))
        .route("/seats/status", get(get_seat_status))
        .route("/seats/hold", post(hold_seat))
}

/* ---------- SEAT MAP ---------- */

#[derive(Debug, Deserialize)]
struct SeatMapQuery {
    shift: String,
}

#[derive(Debug, Serialize)]
struct SeatView {
    id: i64,
    label: String,
    state: SeatState,
    color: &'static str,
}

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    shift: Shift,
    seats: Vec<SeatView>,
}

// GET /api/seats?shift=...
async fn get_seat_map(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeatMapQuery>,
) -> Result<impl IntoResponse, AppError> {
    let shift: Shift = params.shift.parse()?;

    let seats = Seat::list_active(&state.db.pool).await?;
    let status = state.cache.get_seat_status().await?;

    let seats = seats
        .into_iter()
        .map(|seat| {
            let seat_state = status.state_of(seat.id, shift);
            SeatView {
                id: seat.id,
                label: seat.label,
                state: seat_state,
                color: seat_state.color(),
            }
        })
        .collect();

    Ok(Json(SeatMapResponse { shift, seats }))
}

// GET /api/seats/status
async fn get_seat_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.cache.get_seat_status().await?;
    Ok(Json(status))
}

/* ---------- HOLDS ---------- */

#[derive(Debug, Deserialize, Validate)]
pub struct SeatShiftRequest {
    #[validate(range(min = 1, message = "seat_id must be > 0"))]
    pub seat_id: i64,
    pub shift: String,
}

// POST /api/seats/hold
async fn hold_seat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeatShiftRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let shift: Shift = req.shift.parse()?;

    let grant = BookingService::new(state).hold(req.seat_id, shift).await?;
    Ok((StatusCode::CREATED, Json(grant)))
}
