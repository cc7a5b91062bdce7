//! API request/response models for bookings.

use crate::db::models::bookings::BookingDBResponse;
use crate::types::{BookingId, RoomId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

/// Booking lifecycle status.
///
/// Only `Confirmed` bookings occupy a room for availability purposes. The
/// allowed transitions are Pending -> Confirmed, Pending -> Rejected and
/// Confirmed -> Canceled; Canceled and Rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Canceled,
    Rejected,
}

impl BookingStatus {
    /// Every status, in the order they are seeded in `booking_statuses`.
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Canceled,
        BookingStatus::Rejected,
    ];

    /// The TEXT value stored in the `bookings.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Canceled => "Canceled",
            BookingStatus::Rejected => "Rejected",
        }
    }

    /// Whether this booking counts against room availability.
    pub fn occupies_room(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }

    /// Terminal statuses can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Canceled | BookingStatus::Rejected)
    }

    /// Whether the state machine allows moving from `self` to `target`.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        matches!(
            (self, target),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Rejected)
                | (BookingStatus::Confirmed, BookingStatus::Canceled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Canceled" => Ok(BookingStatus::Canceled),
            "Rejected" => Ok(BookingStatus::Rejected),
            other => Err(format!("Unknown booking status: {other}")),
        }
    }
}

/// Request body for creating a booking
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingCreate {
    #[schema(value_type = String, format = "uuid")]
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub special_request: Option<String>,
}

/// Request body for staff changing a booking's status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}

/// Booking response model, joined with room and hotel names for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BookingId,
    #[schema(value_type = String, format = "uuid")]
    pub room_id: RoomId,
    pub room_name: String,
    pub hotel_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub author_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub special_request: Option<String>,
    pub status: BookingStatus,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingDBResponse> for BookingResponse {
    fn from(db: BookingDBResponse) -> Self {
        Self {
            id: db.id,
            room_id: db.room_id,
            room_name: db.room_name,
            hotel_name: db.hotel_name,
            author_id: db.author_id,
            check_in: db.check_in,
            check_out: db.check_out,
            num_guests: db.num_guests,
            special_request: db.special_request,
            status: db.status,
            total_price: db.total_price,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing the caller's bookings
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListBookingsQuery {
    /// Filter by status (e.g. "Confirmed")
    pub status: Option<BookingStatus>,

    /// Number of bookings to skip
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,

    /// Maximum number of bookings to return
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
}

/// Query parameters for a price quote
#[derive(Debug, Deserialize, IntoParams)]
pub struct QuoteQuery {
    #[param(value_type = String, format = "uuid")]
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
}

/// Price quote for a prospective stay
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    #[schema(value_type = String)]
    pub nightly_rate: Decimal,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn only_confirmed_occupies_room() {
        assert!(BookingStatus::Confirmed.occupies_room());
        assert!(!BookingStatus::Pending.occupies_room());
        assert!(!BookingStatus::Canceled.occupies_room());
        assert!(!BookingStatus::Rejected.occupies_room());
    }

    #[test]
    fn transition_rules() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Confirmed.can_transition_to(Canceled));

        assert!(!Pending.can_transition_to(Canceled));
        assert!(!Confirmed.can_transition_to(Rejected));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Canceled.can_transition_to(Confirmed));
        assert!(!Rejected.can_transition_to(Pending));
    }
}
