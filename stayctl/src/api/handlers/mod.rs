//! API request handlers.

pub mod bookings;
pub mod feedback;
pub mod hotels;
