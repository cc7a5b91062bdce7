//! OpenAPI documentation for the booking API at `/api/v1/*`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api;
use crate::api::models::{bookings, feedback, hotels, pagination, rooms, users};

/// Registers the proxy identity header as the API's security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "IdentityHeader",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-stayctl-user"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Booking API server")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::hotels::list_categories,
        api::handlers::hotels::list_cities,
        api::handlers::hotels::list_hotels,
        api::handlers::hotels::get_hotel,
        api::handlers::bookings::create_booking,
        api::handlers::bookings::list_bookings,
        api::handlers::bookings::quote_booking,
        api::handlers::bookings::get_booking,
        api::handlers::bookings::cancel_booking,
        api::handlers::bookings::list_all_bookings,
        api::handlers::bookings::update_booking_status,
        api::handlers::feedback::rate_hotel,
        api::handlers::feedback::list_reviews,
        api::handlers::feedback::create_review,
        api::handlers::feedback::list_my_reviews,
        api::handlers::feedback::delete_review,
        api::handlers::feedback::toggle_favourite,
        api::handlers::feedback::list_favourites,
    ),
    components(
        schemas(
            hotels::CategorySummary,
            hotels::CitySummary,
            hotels::HotelCard,
            hotels::HotelDetail,
            rooms::RoomResponse,
            bookings::BookingStatus,
            bookings::BookingCreate,
            bookings::BookingStatusUpdate,
            bookings::BookingResponse,
            bookings::QuoteResponse,
            feedback::RatingSubmit,
            feedback::RatingResponse,
            feedback::ReviewCreate,
            feedback::ReviewResponse,
            feedback::MyReviewResponse,
            feedback::FavouriteResponse,
            pagination::Pagination,
            users::UserResponse,
            users::CurrentUser,
        )
    ),
    tags(
        (name = "catalog", description = "Browse filters: categories and cities"),
        (name = "hotels", description = "Hotel listings and detail"),
        (name = "bookings", description = "Booking creation, quotes and cancellation"),
        (name = "manage", description = "Staff booking management"),
        (name = "feedback", description = "Ratings, reviews and favourites"),
    ),
    info(
        title = "stayctl API",
        description = "Hotel booking service: availability search, conflict-checked bookings and guest feedback.",
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/bookings"));
        assert!(doc.paths.paths.contains_key("/hotels/{id}"));
    }
}
