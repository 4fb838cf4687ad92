pub mod admin;
pub mod booking;
pub mod seat;

pub use admin::Admin;
pub use booking::{AuditEntry, Booking, NewBooking};
pub use seat::Seat;
