//! Database models for the location/category catalog.

use crate::types::{CategoryId, CityId};

/// A category together with its hotel count
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryCountDBResponse {
    pub id: CategoryId,
    pub name: String,
    pub hotel_count: i64,
}

/// A city joined with its province and country, plus its hotel count
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CityCountDBResponse {
    pub id: CityId,
    pub name: String,
    pub province: String,
    pub country: String,
    pub hotel_count: i64,
}
