//! Database models for bookings.

use crate::api::models::bookings::BookingStatus;
use crate::types::{BookingId, RoomId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Database request for creating a booking
#[derive(Debug, Clone)]
pub struct BookingCreateDBRequest {
    pub id: BookingId,
    pub room_id: RoomId,
    pub author_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub special_request: Option<String>,
    pub status: BookingStatus,
}

/// Filter for listing bookings
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub author_id: Option<UserId>,
    pub status: Option<BookingStatus>,
    pub skip: i64,
    pub limit: i64,
}

/// Raw booking row as it comes off the wire. `status` is TEXT in the database,
/// so decoding to [`BookingStatus`] happens in the [`TryFrom`] conversion.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: BookingId,
    pub room_id: RoomId,
    pub room_name: String,
    pub hotel_name: String,
    pub author_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub special_request: Option<String>,
    pub status: String,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database response for a booking
#[derive(Debug, Clone)]
pub struct BookingDBResponse {
    pub id: BookingId,
    pub room_id: RoomId,
    pub room_name: String,
    pub hotel_name: String,
    pub author_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub special_request: Option<String>,
    pub status: BookingStatus,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for BookingDBResponse {
    type Error = anyhow::Error;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        // A status outside the seeded vocabulary means the booking_statuses
        // table was tampered with; surface it rather than guessing.
        let status = row
            .status
            .parse::<BookingStatus>()
            .map_err(|e| anyhow::anyhow!("Booking {} has invalid status: {e}", row.id))?;
        Ok(Self {
            id: row.id,
            room_id: row.room_id,
            room_name: row.room_name,
            hotel_name: row.hotel_name,
            author_id: row.author_id,
            check_in: row.check_in,
            check_out: row.check_out,
            num_guests: row.num_guests,
            special_request: row.special_request,
            status,
            total_price: row.total_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
