//! Database models for hotels.

use crate::availability::AvailabilityQuery;
use crate::types::{CategoryId, CityId, HotelId, UserId};
use rust_decimal::Decimal;

/// Filter for listing hotels
#[derive(Debug, Clone)]
pub struct HotelListDBFilter {
    pub city_id: Option<CityId>,
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring match on the hotel name
    pub search: Option<String>,
    /// When set, only hotels with at least one free matching room are
    /// returned and `available_rooms` is populated
    pub availability: Option<AvailabilityQuery>,
    /// Whose favourites to mark in the results
    pub viewer_id: UserId,
    pub skip: i64,
    pub limit: i64,
}

/// A hotel row shaped for browse listings, with aggregates computed in SQL
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HotelCardDBResponse {
    pub id: HotelId,
    pub name: String,
    pub stars: i32,
    pub city: String,
    pub category: String,
    pub min_price: Option<Decimal>,
    /// NULL when the listing was not filtered by availability
    pub available_rooms: Option<i64>,
    pub avg_rating: Option<f64>,
    pub ratings_count: i64,
    pub is_favourite: bool,
}

/// Full hotel detail row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HotelDBResponse {
    pub id: HotelId,
    pub name: String,
    pub description: String,
    pub address: String,
    pub stars: i32,
    pub city: String,
    pub province: String,
    pub country: String,
    pub category: String,
    pub avg_rating: Option<f64>,
    pub ratings_count: i64,
}
