//! Database models for ratings and reviews.

use crate::types::{HotelId, RatingId, ReviewId, UserId};
use chrono::{DateTime, Utc};

/// Database request for upserting a rating
#[derive(Debug, Clone)]
pub struct RatingUpsertDBRequest {
    pub hotel_id: HotelId,
    pub author_id: UserId,
    pub value: i32,
}

/// Database response for a rating
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RatingDBResponse {
    pub id: RatingId,
    pub hotel_id: HotelId,
    pub author_id: UserId,
    pub value: i32,
}

/// Aggregate rating for a hotel
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RatingAggregateDBResponse {
    pub avg_rating: Option<f64>,
    pub ratings_count: i64,
}

/// Database request for creating a review
#[derive(Debug, Clone)]
pub struct ReviewCreateDBRequest {
    pub hotel_id: HotelId,
    pub author_id: UserId,
    pub comment: String,
}

/// Database response for a review, joined with the author's username
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewDBResponse {
    pub id: ReviewId,
    pub hotel_id: HotelId,
    pub author_id: UserId,
    pub author_username: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// One of a user's own reviews, joined with the hotel name and the rating
/// the same user gave that hotel, if any
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthorReviewDBResponse {
    pub id: ReviewId,
    pub hotel_id: HotelId,
    pub hotel_name: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub rating: Option<i32>,
}
