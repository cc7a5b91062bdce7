//! API request/response models.

pub mod bookings;
pub mod feedback;
pub mod hotels;
pub mod pagination;
pub mod rooms;
pub mod users;
