//! API request/response models for the hotel catalog.

use crate::availability::AvailabilityQuery;
use crate::db::models::hotels::{HotelCardDBResponse, HotelDBResponse};
use crate::errors::Error;
use crate::types::{CategoryId, CityId, HotelId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A hotel category with the number of hotels in it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategorySummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: CategoryId,
    pub name: String,
    pub hotel_count: i64,
}

/// A city with its province and country names, and the number of hotels in it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CitySummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: CityId,
    pub name: String,
    pub province: String,
    pub country: String,
    pub hotel_count: i64,
}

/// Query parameters for browsing hotels.
///
/// The availability fields (`check_in`, `check_out`, `num_guests`) travel
/// together: when a date range is given the results only include hotels with
/// at least one free room for it. Without dates the listing is unfiltered by
/// availability.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListHotelsQuery {
    /// Filter by city
    #[param(value_type = Option<String>, format = "uuid")]
    pub city_id: Option<CityId>,

    /// Filter by category
    #[param(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,

    /// Case-insensitive substring match on hotel name
    pub search: Option<String>,

    /// Desired check-in date
    pub check_in: Option<NaiveDate>,

    /// Desired check-out date
    pub check_out: Option<NaiveDate>,

    /// Number of guests (default: 1 when dates are given)
    pub num_guests: Option<i32>,

    /// Number of hotels to skip
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,

    /// Maximum number of hotels to return
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
}

impl ListHotelsQuery {
    /// Resolve the availability portion of the query.
    ///
    /// Returns `Ok(None)` when no dates were supplied. Giving only one of the
    /// two dates, or an invalid range, is a validation error.
    pub fn availability(&self, today: NaiveDate) -> Result<Option<AvailabilityQuery>, Error> {
        AvailabilityParams {
            check_in: self.check_in,
            check_out: self.check_out,
            num_guests: self.num_guests,
        }
        .availability(today)
    }
}

/// An optional availability query carried by a browse endpoint.
///
/// On the hotel detail page the room list is restricted to rooms free for
/// the stay; on the category list, hotel counts only cover hotels with at
/// least one free room.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AvailabilityParams {
    /// Desired check-in date
    pub check_in: Option<NaiveDate>,

    /// Desired check-out date
    pub check_out: Option<NaiveDate>,

    /// Number of guests (default: 1 when dates are given)
    pub num_guests: Option<i32>,
}

impl AvailabilityParams {
    pub fn availability(&self, today: NaiveDate) -> Result<Option<AvailabilityQuery>, Error> {
        match (self.check_in, self.check_out) {
            (None, None) => Ok(None),
            (Some(check_in), Some(check_out)) => {
                let query = AvailabilityQuery {
                    check_in,
                    check_out,
                    num_guests: self.num_guests.unwrap_or(1),
                };
                query.validate(today).map_err(|errors| Error::Validation { errors })?;
                Ok(Some(query))
            }
            _ => Err(Error::validation(
                "Both check_in and check_out must be provided to filter by availability",
            )),
        }
    }
}

/// A hotel as shown in browse listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HotelCard {
    #[schema(value_type = String, format = "uuid")]
    pub id: HotelId,
    pub name: String,
    pub stars: i32,
    pub city: String,
    pub category: String,
    /// Cheapest nightly rate across the hotel's rooms
    #[schema(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    /// Number of rooms matching the availability query, when one was given
    pub available_rooms: Option<i64>,
    /// Average guest rating (1-10 scale), if anyone has rated
    pub avg_rating: Option<f64>,
    pub ratings_count: i64,
    /// Whether the current caller has favourited this hotel
    pub is_favourite: bool,
}

/// Full hotel detail
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HotelDetail {
    #[schema(value_type = String, format = "uuid")]
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
    pub rooms: Vec<super::rooms::RoomResponse>,
    /// Most recent reviews, newest first
    pub reviews: Vec<super::feedback::ReviewResponse>,
    /// The caller's own rating of this hotel, if they have rated it
    pub my_rating: Option<i32>,
    pub is_favourite: bool,
}

impl From<HotelCardDBResponse> for HotelCard {
    fn from(db: HotelCardDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            stars: db.stars,
            city: db.city,
            category: db.category,
            min_price: db.min_price,
            available_rooms: db.available_rooms,
            avg_rating: db.avg_rating,
            ratings_count: db.ratings_count,
            is_favourite: db.is_favourite,
        }
    }
}

impl HotelDetail {
    pub fn from_db(
        db: HotelDBResponse,
        rooms: Vec<super::rooms::RoomResponse>,
        reviews: Vec<super::feedback::ReviewResponse>,
        my_rating: Option<i32>,
        is_favourite: bool,
    ) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            address: db.address,
            stars: db.stars,
            city: db.city,
            province: db.province,
            country: db.country,
            category: db.category,
            avg_rating: db.avg_rating,
            ratings_count: db.ratings_count,
            rooms,
            reviews,
            my_rating,
            is_favourite,
        }
    }
}
