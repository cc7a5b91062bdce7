//! Handlers for the booking workflow.
//!
//! Creation checks availability and inserts in one transaction; the
//! `bookings_confirmed_no_overlap` exclusion constraint backstops the check
//! when two requests race, so a double booking can never commit.

use crate::api::models::bookings::{
    BookingCreate, BookingResponse, BookingStatusUpdate, ListBookingsQuery, QuoteQuery, QuoteResponse,
};
use crate::api::models::pagination::{PaginatedResponse, Pagination};
use crate::api::models::users::CurrentUser;
use crate::auth::Staff;
use crate::availability::{AvailabilityQuery, StayRange};
use crate::db::handlers::{Bookings, Repository, Rooms, Users};
use crate::db::models::bookings::{BookingCreateDBRequest, BookingFilter};
use crate::errors::{Error, Result};
use crate::notifications::notify_status_change;
use crate::types::{BookingId, RoomId};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::Acquire;
use uuid::Uuid;

const ROOM_UNAVAILABLE: &str = "The room is not available for the selected dates.";

fn booking_not_found(id: BookingId) -> Error {
    Error::NotFound {
        resource: "Booking".to_string(),
        id: id.to_string(),
    }
}

fn room_not_found(id: RoomId) -> Error {
    Error::NotFound {
        resource: "Room".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    summary = "Create a booking",
    request_body = BookingCreate,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Room not available for the selected dates"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(room_id = %body.room_id))]
pub async fn create_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<BookingCreate>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let today = chrono::Utc::now().date_naive();

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let room;
    {
        let mut rooms = Rooms::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        room = rooms.get_by_id(body.room_id).await?.ok_or_else(|| room_not_found(body.room_id))?;
    }

    let query = AvailabilityQuery {
        check_in: body.check_in,
        check_out: body.check_out,
        num_guests: body.num_guests,
    };
    let range = query.validate(today).map_err(|errors| Error::Validation { errors })?;

    let mut bookings = Bookings::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    if bookings.has_confirmed_overlap(body.room_id, &range, None).await? {
        return Err(Error::conflict(ROOM_UNAVAILABLE));
    }

    // A taken room surfaces as a conflict before any capacity complaint.
    if body.num_guests > room.capacity {
        return Err(Error::validation(
            "Room capacity is lower than the number of guests requested",
        ));
    }

    let booking = bookings
        .create(&BookingCreateDBRequest {
            id: Uuid::new_v4(),
            room_id: body.room_id,
            author_id: user.id,
            check_in: body.check_in,
            check_out: body.check_out,
            num_guests: body.num_guests,
            special_request: body.special_request.clone(),
            status: state.config.booking.initial_status,
        })
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    summary = "List the caller's bookings",
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "Paginated bookings", body = PaginatedResponse<BookingResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<PaginatedResponse<BookingResponse>>> {
    let (skip, limit) = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .params();
    let filter = BookingFilter {
        author_id: Some(user.id),
        status: query.status,
        skip,
        limit,
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Bookings::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let bookings: Vec<BookingResponse> = repo.list(&filter).await?.into_iter().map(BookingResponse::from).collect();
    let total_count = repo.count(&filter).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(PaginatedResponse::new(bookings, total_count, skip, limit)))
}

#[utoipa::path(
    get,
    path = "/bookings/quote",
    tag = "bookings",
    summary = "Price a prospective stay",
    params(QuoteQuery),
    responses(
        (status = 200, description = "Quote for the stay", body = QuoteResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Room not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(room_id = %query.room_id))]
pub async fn quote_booking(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<QuoteResponse>> {
    let today = chrono::Utc::now().date_naive();

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let room;
    {
        let mut rooms = Rooms::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        room = rooms.get_by_id(query.room_id).await?.ok_or_else(|| room_not_found(query.room_id))?;
    }

    let availability = AvailabilityQuery {
        check_in: query.check_in,
        check_out: query.check_out,
        num_guests: query.num_guests,
    };
    // Date rules are hard errors; a full room or an undersized one just makes
    // the quote unavailable.
    let range = availability
        .validate(today)
        .map_err(|errors| Error::Validation { errors })?;

    let mut bookings = Bookings::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let overlaps = bookings.has_confirmed_overlap(query.room_id, &range, None).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let fits = query.num_guests <= room.capacity;
    Ok(Json(QuoteResponse {
        room_id: room.id,
        check_in: range.check_in,
        check_out: range.check_out,
        nights: range.nights(),
        nightly_rate: room.price,
        total_price: range.total_price(room.price),
        available: fits && !overlaps,
    }))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    summary = "Get a booking",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "The booking", body = BookingResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Booking not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn get_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Bookings::new(&mut conn);

    let booking = repo.get_by_id(id).await?.ok_or_else(|| booking_not_found(id))?;
    // Other users' bookings are indistinguishable from missing ones.
    if booking.author_id != user.id && !user.is_staff {
        return Err(booking_not_found(id));
    }
    Ok(Json(booking.into()))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    summary = "Cancel a confirmed booking",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking canceled", body = BookingResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not in a cancelable status"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingResponse>> {
    use crate::api::models::bookings::BookingStatus;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Bookings::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);

    let booking = repo.get_by_id(id).await?.ok_or_else(|| booking_not_found(id))?;
    if booking.author_id != user.id && !user.is_staff {
        return Err(booking_not_found(id));
    }

    // Lock the row so a concurrent staff transition can't interleave.
    let status = repo.get_status_for_update(id).await?.ok_or_else(|| booking_not_found(id))?;
    if !status.can_transition_to(BookingStatus::Canceled) {
        return Err(Error::conflict(format!("A {status} booking can not be canceled")));
    }

    let updated = repo.update_status(id, BookingStatus::Canceled).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    get,
    path = "/manage/bookings",
    tag = "manage",
    summary = "List all bookings (staff)",
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "Paginated bookings across all guests", body = PaginatedResponse<BookingResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not staff"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_all_bookings(
    State(state): State<AppState>,
    Staff(_user): Staff,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<PaginatedResponse<BookingResponse>>> {
    let (skip, limit) = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .params();
    let filter = BookingFilter {
        author_id: None,
        status: query.status,
        skip,
        limit,
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Bookings::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let bookings: Vec<BookingResponse> = repo.list(&filter).await?.into_iter().map(BookingResponse::from).collect();
    let total_count = repo.count(&filter).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(PaginatedResponse::new(bookings, total_count, skip, limit)))
}

#[utoipa::path(
    patch,
    path = "/manage/bookings/{id}",
    tag = "manage",
    summary = "Change a booking's status (staff)",
    params(("id" = String, Path, description = "Booking ID")),
    request_body = BookingStatusUpdate,
    responses(
        (status = 200, description = "Booking updated", body = BookingResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not staff"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transition not allowed, or dates no longer available"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(booking_id = %id, target = %body.status))]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Staff(_user): Staff,
    Path(id): Path<BookingId>,
    Json(body): Json<BookingStatusUpdate>,
) -> Result<Json<BookingResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let updated;
    {
        let mut repo = Bookings::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);

        let current = repo.get_status_for_update(id).await?.ok_or_else(|| booking_not_found(id))?;
        if !current.can_transition_to(body.status) {
            return Err(Error::conflict(format!(
                "A {current} booking can not be moved to {}",
                body.status
            )));
        }

        // A Pending booking never held its dates, so the room may have been
        // taken since it was created.
        if body.status.occupies_room() && state.config.booking.revalidate_on_confirm {
            let booking = repo.get_by_id(id).await?.ok_or_else(|| booking_not_found(id))?;
            let range = StayRange::new(booking.check_in, booking.check_out);
            if repo.has_confirmed_overlap(booking.room_id, &range, Some(id)).await? {
                return Err(Error::conflict(ROOM_UNAVAILABLE));
            }
        }

        updated = repo.update_status(id, body.status).await?;
    }

    let author;
    {
        let mut users = Users::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        author = users.get_by_id(updated.author_id).await?;
    }
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    if let Some(author) = author {
        notify_status_change(&state, &updated, &author);
    }

    Ok(Json(updated.into()))
}
