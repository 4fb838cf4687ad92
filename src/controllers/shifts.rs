use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::shifts::Shift;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/shifts", get(list_shifts))
}

#[derive(Debug, Serialize)]
pub struct ShiftResponse {
    pub shift: Shift,
    pub overlaps: &'static [Shift],
}

// GET /api/shifts
pub async fn list_shifts() -> Json<Vec<ShiftResponse>> {
    Json(
        Shift::ALL
            .into_iter()
            .map(|shift| ShiftResponse {
                shift,
                overlaps: shift.overlapping(),
            })
            .collect(),
    )
}
