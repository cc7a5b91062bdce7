//! API request/response models for ratings, reviews and favourites.

use crate::db::models::feedback::{AuthorReviewDBResponse, ReviewDBResponse};
use crate::types::{HotelId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for rating a hotel. One rating per user per hotel;
/// re-submitting replaces the previous value.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatingSubmit {
    /// Rating value on a 1-10 scale
    #[schema(minimum = 1, maximum = 10)]
    pub value: i32,
}

/// A hotel's aggregate rating after a submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatingResponse {
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    /// The caller's own rating
    pub value: i32,
    pub avg_rating: Option<f64>,
    pub ratings_count: i64,
}

/// Request body for posting a review
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewCreate {
    pub comment: String,
}

/// Review response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReviewId,
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    #[schema(value_type = String, format = "uuid")]
    pub author_id: UserId,
    pub author_username: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewDBResponse> for ReviewResponse {
    fn from(db: ReviewDBResponse) -> Self {
        Self {
            id: db.id,
            hotel_id: db.hotel_id,
            author_id: db.author_id,
            author_username: db.author_username,
            comment: db.comment,
            created_at: db.created_at,
        }
    }
}

/// One of the caller's own reviews, with the rating they gave the hotel
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MyReviewResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReviewId,
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    pub hotel_name: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    /// The caller's rating of the same hotel, if they have rated it
    pub my_rating: Option<i32>,
}

impl From<AuthorReviewDBResponse> for MyReviewResponse {
    fn from(db: AuthorReviewDBResponse) -> Self {
        Self {
            id: db.id,
            hotel_id: db.hotel_id,
            hotel_name: db.hotel_name,
            comment: db.comment,
            created_at: db.created_at,
            my_rating: db.rating,
        }
    }
}

/// Result of toggling a favourite
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavouriteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    /// Whether the hotel is favourited after the toggle
    pub is_favourite: bool,
}
