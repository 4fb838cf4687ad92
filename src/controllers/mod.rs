pub mod bookings;
pub mod seats;
pub mod shifts;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(shifts::routes())
        .merge(seats::routes())
        .merge(bookings::routes())
}
