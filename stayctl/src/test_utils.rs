//! Test utilities for integration testing (available with `test-utils` feature).

use crate::api::models::bookings::BookingStatus;
use crate::config::{Config, EmailTransportConfig};
use crate::db::models::users::UserDBResponse;
use crate::types::{BookingId, CategoryId, CityId, HotelId, RoomId, UserId};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// A hotel created for tests, with the catalog rows it hangs off.
#[derive(Debug, Clone, Copy)]
pub struct TestHotel {
    pub id: HotelId,
    pub category_id: CategoryId,
    pub city_id: CityId,
}

pub fn create_test_config() -> Config {
    // Use temp directory for test emails
    let temp_dir = std::env::temp_dir().join(format!("stayctl-test-emails-{}", std::process::id()));

    let mut config = Config::default();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config.staff_email = "staff@example.com".to_string();
    config.email.enabled = true;
    config.email.transport = EmailTransportConfig::File {
        path: temp_dir.to_string_lossy().to_string(),
    };
    config
}

/// Insert a hotel with a fresh country/province/city/category chain.
pub async fn create_test_hotel(pool: &PgPool, name: &str) -> TestHotel {
    let suffix = Uuid::new_v4();

    let country_id: Uuid = sqlx::query_scalar("INSERT INTO countries (id, name) VALUES ($1, $2) RETURNING id")
        .bind(Uuid::new_v4())
        .bind(format!("Country {suffix}"))
        .fetch_one(pool)
        .await
        .expect("insert test country");

    let province_id: Uuid =
        sqlx::query_scalar("INSERT INTO provinces (id, country_id, name) VALUES ($1, $2, $3) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(country_id)
            .bind(format!("Province {suffix}"))
            .fetch_one(pool)
            .await
            .expect("insert test province");

    let city_id: CityId =
        sqlx::query_scalar("INSERT INTO cities (id, province_id, name) VALUES ($1, $2, $3) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(province_id)
            .bind(format!("City {suffix}"))
            .fetch_one(pool)
            .await
            .expect("insert test city");

    let category_id: CategoryId = sqlx::query_scalar("INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING id")
        .bind(Uuid::new_v4())
        .bind(format!("Category {suffix}"))
        .fetch_one(pool)
        .await
        .expect("insert test category");

    let id: HotelId = sqlx::query_scalar(
        r#"
        INSERT INTO hotels (id, category_id, city_id, name, description, address, stars)
        VALUES ($1, $2, $3, $4, 'A hotel for tests', '1 Test Street', 4)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(category_id)
    .bind(city_id)
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("insert test hotel");

    TestHotel {
        id,
        category_id,
        city_id,
    }
}

pub async fn create_test_room(pool: &PgPool, hotel_id: HotelId, price: Decimal, capacity: i32) -> RoomId {
    sqlx::query_scalar(
        r#"
        INSERT INTO rooms (id, hotel_id, name, description, price, capacity)
        VALUES ($1, $2, $3, 'A room for tests', $4, $5)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(hotel_id)
    .bind(format!("Room {}", Uuid::new_v4()))
    .bind(price)
    .bind(capacity)
    .fetch_one(pool)
    .await
    .expect("insert test room")
}

pub async fn create_test_user(pool: &PgPool, email: &str, is_staff: bool) -> UserDBResponse {
    sqlx::query_as::<_, UserDBResponse>(
        r#"
        INSERT INTO users (id, username, email, is_staff)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, email, display_name, is_staff, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.split('@').next().unwrap_or(email))
    .bind(email)
    .bind(is_staff)
    .fetch_one(pool)
    .await
    .expect("insert test user")
}

/// Insert a booking directly, bypassing the application-side availability
/// check. Tests use this to stage arbitrary occupancy.
pub async fn create_test_booking(
    pool: &PgPool,
    room_id: RoomId,
    author_id: UserId,
    check_in: &str,
    check_out: &str,
    status: BookingStatus,
) -> BookingId {
    let check_in: chrono::NaiveDate = check_in.parse().expect("valid check_in date");
    let check_out: chrono::NaiveDate = check_out.parse().expect("valid check_out date");

    sqlx::query_scalar(
        r#"
        INSERT INTO bookings (id, room_id, author_id, check_in, check_out, num_guests, status)
        VALUES ($1, $2, $3, $4, $5, 2, $6)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(room_id)
    .bind(author_id)
    .bind(check_in)
    .bind(check_out)
    .bind(status.as_str())
    .fetch_one(pool)
    .await
    .expect("insert test booking")
}

#[cfg(test)]
pub async fn create_test_app(pool: PgPool) -> axum_test::TestServer {
    let config = create_test_config();
    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");
    app.into_test_server()
}
