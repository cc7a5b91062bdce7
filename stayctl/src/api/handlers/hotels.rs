//! Handlers for browsing the hotel catalog.

use crate::api::models::feedback::ReviewResponse;
use crate::api::models::hotels::{
    AvailabilityParams, CategorySummary, CitySummary, HotelCard, HotelDetail, ListHotelsQuery,
};
use crate::api::models::pagination::{PaginatedResponse, Pagination};
use crate::api::models::rooms::RoomResponse;
use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Catalog, Feedback, Hotels, Rooms};
use crate::db::models::hotels::HotelListDBFilter;
use crate::db::models::rooms::RoomSearchScope;
use crate::errors::{Error, Result};
use crate::types::HotelId;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::Acquire;

/// How many reviews ride along on the detail page; the rest are paged
/// through `GET /hotels/{id}/reviews`.
const RECENT_REVIEWS: i64 = 10;

#[utoipa::path(
    get,
    path = "/categories",
    tag = "catalog",
    summary = "List hotel categories",
    params(AvailabilityParams),
    responses(
        (status = 200, description = "Categories with hotel counts", body = Vec<CategorySummary>),
        (status = 400, description = "Invalid availability query"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<AvailabilityParams>,
) -> Result<Json<Vec<CategorySummary>>> {
    let today = chrono::Utc::now().date_naive();
    let availability = query.availability(today)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Catalog::new(&mut conn);

    let categories = repo
        .list_categories(availability.as_ref())
        .await?
        .into_iter()
        .map(|c| CategorySummary {
            id: c.id,
            name: c.name,
            hotel_count: c.hotel_count,
        })
        .collect();
    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/cities",
    tag = "catalog",
    summary = "List cities with hotels",
    responses(
        (status = 200, description = "Cities with hotel counts", body = Vec<CitySummary>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_cities(State(state): State<AppState>, _user: CurrentUser) -> Result<Json<Vec<CitySummary>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Catalog::new(&mut conn);

    let cities = repo
        .list_cities()
        .await?
        .into_iter()
        .map(|c| CitySummary {
            id: c.id,
            name: c.name,
            province: c.province,
            country: c.country,
            hotel_count: c.hotel_count,
        })
        .collect();
    Ok(Json(cities))
}

#[utoipa::path(
    get,
    path = "/hotels",
    tag = "hotels",
    summary = "Browse hotels",
    params(ListHotelsQuery),
    responses(
        (status = 200, description = "Paginated hotel listing", body = PaginatedResponse<HotelCard>),
        (status = 400, description = "Invalid availability query"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_hotels(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListHotelsQuery>,
) -> Result<Json<PaginatedResponse<HotelCard>>> {
    let today = chrono::Utc::now().date_naive();
    let availability = query.availability(today)?;
    let (skip, limit) = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .params();

    let filter = HotelListDBFilter {
        city_id: query.city_id,
        category_id: query.category_id,
        search: query.search.clone(),
        availability,
        viewer_id: user.id,
        skip,
        limit,
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Hotels::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);

    let cards: Vec<HotelCard> = repo.list(&filter).await?.into_iter().map(HotelCard::from).collect();
    let total_count = repo.count(&filter).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(PaginatedResponse::new(cards, total_count, skip, limit)))
}

#[utoipa::path(
    get,
    path = "/hotels/{id}",
    tag = "hotels",
    summary = "Get hotel detail",
    params(
        ("id" = String, Path, description = "Hotel ID"),
        AvailabilityParams
    ),
    responses(
        (status = 200, description = "Hotel detail with rooms and reviews", body = HotelDetail),
        (status = 400, description = "Invalid availability query"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Hotel not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(hotel_id = %id))]
pub async fn get_hotel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<HotelId>,
    Query(query): Query<AvailabilityParams>,
) -> Result<Json<HotelDetail>> {
    let today = chrono::Utc::now().date_naive();
    let availability = query.availability(today)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let hotel;
    let is_favourite;
    {
        let mut repo = Hotels::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        hotel = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Hotel".to_string(),
            id: id.to_string(),
        })?;
        is_favourite = repo.is_favourite(id, user.id).await?;
    }

    let rooms;
    {
        let mut repo = Rooms::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        rooms = match &availability {
            Some(availability) => repo.find_available(RoomSearchScope::Hotel(id), availability).await?,
            None => repo.list_by_hotel(id).await?,
        };
    }

    let reviews;
    let my_rating;
    {
        let mut repo = Feedback::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        reviews = repo.list_reviews(id, 0, RECENT_REVIEWS).await?;
        my_rating = repo.get_rating(id, user.id).await?.map(|r| r.value);
    }
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let rooms = rooms.into_iter().map(RoomResponse::from).collect();
    let reviews = reviews.into_iter().map(ReviewResponse::from).collect();
    Ok(Json(HotelDetail::from_db(hotel, rooms, reviews, my_rating, is_favourite)))
}
