//! Database model types.
//!
//! These are the request/response shapes the repository layer speaks. Rows are
//! decoded with `sqlx::FromRow`; types the database cannot decode directly
//! (like [`crate::api::models::bookings::BookingStatus`], stored as TEXT) get
//! an intermediate row struct plus a fallible conversion.

pub mod bookings;
pub mod catalog;
pub mod feedback;
pub mod hotels;
pub mod rooms;
pub mod users;
