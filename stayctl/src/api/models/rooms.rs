//! API request/response models for rooms.

use crate::db::models::rooms::RoomDBResponse;
use crate::types::{HotelId, RoomId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Room response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: RoomId,
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    pub name: String,
    pub description: String,
    /// Nightly rate
    #[schema(value_type = String)]
    pub price: Decimal,
    pub capacity: i32,
}

impl From<RoomDBResponse> for RoomResponse {
    fn from(db: RoomDBResponse) -> Self {
        Self {
            id: db.id,
            hotel_id: db.hotel_id,
            name: db.name,
            description: db.description,
            price: db.price,
            capacity: db.capacity,
        }
    }
}
