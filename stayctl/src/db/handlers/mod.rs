//! Repository implementations for database access.
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed operations for one entity
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Users`]: User account management
//! - [`Catalog`]: Categories and cities for browse filters
//! - [`Hotels`]: Hotel listings and detail, with availability-aware aggregates
//! - [`Rooms`]: Room lookup and availability search
//! - [`Bookings`]: Booking creation, the overlap guard, and status transitions
//! - [`Feedback`]: Ratings, reviews and favourites

pub mod bookings;
pub mod catalog;
pub mod feedback;
pub mod hotels;
pub mod repository;
pub mod rooms;
pub mod users;

pub use bookings::Bookings;
pub use catalog::Catalog;
pub use feedback::Feedback;
pub use hotels::Hotels;
pub use repository::Repository;
pub use rooms::Rooms;
pub use users::Users;
