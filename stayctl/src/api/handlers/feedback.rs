//! Handlers for ratings, reviews and favourites.

use crate::api::models::feedback::{
    FavouriteResponse, MyReviewResponse, RatingResponse, RatingSubmit, ReviewCreate, ReviewResponse,
};
use crate::api::models::hotels::HotelCard;
use crate::api::models::pagination::Pagination;
use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Feedback, Hotels};
use crate::db::models::feedback::{RatingUpsertDBRequest, ReviewCreateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{HotelId, ReviewId};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::Acquire;

fn hotel_not_found(id: HotelId) -> Error {
    Error::NotFound {
        resource: "Hotel".to_string(),
        id: id.to_string(),
    }
}

async fn ensure_hotel_exists(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, id: HotelId) -> Result<()> {
    let mut repo = Hotels::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    repo.get_by_id(id).await?.ok_or_else(|| hotel_not_found(id))?;
    Ok(())
}

#[utoipa::path(
    put,
    path = "/hotels/{id}/rating",
    tag = "feedback",
    summary = "Rate a hotel",
    params(("id" = String, Path, description = "Hotel ID")),
    request_body = RatingSubmit,
    responses(
        (status = 200, description = "Updated aggregate rating", body = RatingResponse),
        (status = 400, description = "Rating out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Hotel not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(hotel_id = %id))]
pub async fn rate_hotel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<HotelId>,
    Json(body): Json<RatingSubmit>,
) -> Result<Json<RatingResponse>> {
    if !(1..=10).contains(&body.value) {
        return Err(Error::validation("Rating must be between 1 and 10"));
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_hotel_exists(&mut tx, id).await?;

    let mut repo = Feedback::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let rating = repo
        .upsert_rating(&RatingUpsertDBRequest {
            hotel_id: id,
            author_id: user.id,
            value: body.value,
        })
        .await?;
    let aggregate = repo.rating_aggregate(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(RatingResponse {
        hotel_id: id,
        value: rating.value,
        avg_rating: aggregate.avg_rating,
        ratings_count: aggregate.ratings_count,
    }))
}

#[utoipa::path(
    get,
    path = "/hotels/{id}/reviews",
    tag = "feedback",
    summary = "List a hotel's reviews",
    params(
        ("id" = String, Path, description = "Hotel ID"),
        Pagination
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = Vec<ReviewResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Hotel not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(hotel_id = %id))]
pub async fn list_reviews(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<HotelId>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<ReviewResponse>>> {
    let (skip, limit) = pagination.params();

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_hotel_exists(&mut tx, id).await?;

    let mut repo = Feedback::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let reviews = repo.list_reviews(id, skip, limit).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/hotels/{id}/reviews",
    tag = "feedback",
    summary = "Post a review",
    params(("id" = String, Path, description = "Hotel ID")),
    request_body = ReviewCreate,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Empty comment"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Hotel not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(hotel_id = %id))]
pub async fn create_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<HotelId>,
    Json(body): Json<ReviewCreate>,
) -> Result<(StatusCode, Json<ReviewResponse>)> {
    if body.comment.trim().is_empty() {
        return Err(Error::validation("Comment can not be empty"));
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_hotel_exists(&mut tx, id).await?;

    let mut repo = Feedback::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let review = repo
        .create_review(&ReviewCreateDBRequest {
            hotel_id: id,
            author_id: user.id,
            comment: body.comment.trim().to_string(),
        })
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(review.into())))
}

#[utoipa::path(
    get,
    path = "/reviews",
    tag = "feedback",
    summary = "List the caller's own reviews",
    responses(
        (status = 200, description = "The caller's reviews, newest first, with their rating of each hotel", body = Vec<MyReviewResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_my_reviews(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<MyReviewResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Feedback::new(&mut conn);

    let reviews = repo.list_reviews_by_author(user.id).await?;
    Ok(Json(reviews.into_iter().map(MyReviewResponse::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    tag = "feedback",
    summary = "Delete a review",
    params(("id" = String, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the author nor staff"),
        (status = 404, description = "Review not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(review_id = %id))]
pub async fn delete_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Feedback::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);

    let review = repo.get_review_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Review".to_string(),
        id: id.to_string(),
    })?;
    if review.author_id != user.id && !user.is_staff {
        return Err(Error::Forbidden {
            action: "delete another user's review".to_string(),
        });
    }

    repo.delete_review(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/hotels/{id}/favourite",
    tag = "feedback",
    summary = "Toggle a hotel in the caller's favourites",
    params(("id" = String, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "New favourite state", body = FavouriteResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Hotel not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(hotel_id = %id))]
pub async fn toggle_favourite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<HotelId>,
) -> Result<Json<FavouriteResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_hotel_exists(&mut tx, id).await?;

    let mut repo = Feedback::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let is_favourite = repo.toggle_favourite(user.id, id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(FavouriteResponse {
        hotel_id: id,
        is_favourite,
    }))
}

#[utoipa::path(
    get,
    path = "/favourites",
    tag = "feedback",
    summary = "List the caller's favourite hotels",
    responses(
        (status = 200, description = "Favourite hotels, most recently added first", body = Vec<HotelCard>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_favourites(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<HotelCard>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Feedback::new(&mut conn);

    let cards = repo.list_favourites(user.id).await?;
    Ok(Json(cards.into_iter().map(HotelCard::from).collect()))
}
