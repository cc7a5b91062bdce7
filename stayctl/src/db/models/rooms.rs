//! Database models for rooms.

use crate::types::{CategoryId, CityId, HotelId, RoomId};
use rust_decimal::Decimal;

/// Where to look for available rooms.
#[derive(Debug, Clone, Copy)]
pub enum RoomSearchScope {
    All,
    Hotel(HotelId),
    Category(CategoryId),
    City(CityId),
}

impl RoomSearchScope {
    /// Bind values for the optional-filter query: `(hotel, category, city)`.
    pub fn params(self) -> (Option<HotelId>, Option<CategoryId>, Option<CityId>) {
        match self {
            RoomSearchScope::All => (None, None, None),
            RoomSearchScope::Hotel(id) => (Some(id), None, None),
            RoomSearchScope::Category(id) => (None, Some(id), None),
            RoomSearchScope::City(id) => (None, None, Some(id)),
        }
    }
}

/// Database response for a room
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoomDBResponse {
    pub id: RoomId,
    pub hotel_id: HotelId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub capacity: i32,
}
