//! Room repository, including the availability search.

use sqlx::PgConnection;
use tracing::instrument;

use crate::api::models::bookings::BookingStatus;
use crate::availability::AvailabilityQuery;
use crate::db::errors::Result;
use crate::db::models::rooms::{RoomDBResponse, RoomSearchScope};
use crate::types::{HotelId, RoomId};

pub struct Rooms<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Rooms<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: RoomId) -> Result<Option<RoomDBResponse>> {
        let room = sqlx::query_as::<_, RoomDBResponse>(
            r#"
            SELECT id, hotel_id, name, description, price, capacity
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(room)
    }

    #[instrument(skip(self), err)]
    pub async fn list_by_hotel(&mut self, hotel_id: HotelId) -> Result<Vec<RoomDBResponse>> {
        let rooms = sqlx::query_as::<_, RoomDBResponse>(
            r#"
            SELECT id, hotel_id, name, description, price, capacity
            FROM rooms
            WHERE hotel_id = $1
            ORDER BY price, name
            "#,
        )
        .bind(hotel_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(rooms)
    }

    /// Rooms in scope that fit the party and are free for the whole range.
    ///
    /// A room is free when no Confirmed booking overlaps the half-open
    /// `[check_in, check_out)` interval. Pending, Canceled and Rejected
    /// bookings never block a room.
    #[instrument(skip(self), err)]
    pub async fn find_available(
        &mut self,
        scope: RoomSearchScope,
        query: &AvailabilityQuery,
    ) -> Result<Vec<RoomDBResponse>> {
        let (hotel_id, category_id, city_id) = scope.params();
        let rooms = sqlx::query_as::<_, RoomDBResponse>(
            r#"
            SELECT r.id, r.hotel_id, r.name, r.description, r.price, r.capacity
            FROM rooms r
            JOIN hotels h ON h.id = r.hotel_id
            WHERE ($1::uuid IS NULL OR r.hotel_id = $1)
              AND ($2::uuid IS NULL OR h.category_id = $2)
              AND ($3::uuid IS NULL OR h.city_id = $3)
              AND r.capacity >= $4
              AND NOT EXISTS (
                  SELECT 1
                  FROM bookings b
                  WHERE b.room_id = r.id
                    AND b.status = $5
                    AND b.check_in < $7
                    AND b.check_out > $6
              )
            ORDER BY r.price, r.name
            "#,
        )
        .bind(hotel_id)
        .bind(category_id)
        .bind(city_id)
        .bind(query.num_guests)
        .bind(BookingStatus::Confirmed.as_str())
        .bind(query.check_in)
        .bind(query.check_out)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(rooms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_booking, create_test_hotel, create_test_room, create_test_user};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn query(check_in: &str, check_out: &str, num_guests: i32) -> AvailabilityQuery {
        AvailabilityQuery {
            check_in: date(check_in),
            check_out: date(check_out),
            num_guests,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_confirmed_booking_blocks_overlapping_range(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Overlap Hotel").await;
        let room = create_test_room(&pool, hotel.id, Decimal::new(10000, 2), 2).await;
        let guest = create_test_user(&pool, "guest-overlap@example.com", false).await;
        create_test_booking(&pool, room, guest.id, "2024-06-10", "2024-06-15", BookingStatus::Confirmed).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Rooms::new(&mut conn);

        let free = repo.find_available(RoomSearchScope::Hotel(hotel.id), &query("2024-06-12", "2024-06-14", 2)).await.unwrap();
        assert!(free.is_empty());

        let free = repo.find_available(RoomSearchScope::Hotel(hotel.id), &query("2024-06-20", "2024-06-22", 2)).await.unwrap();
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].id, room);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_back_to_back_turnover_is_free(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Turnover Hotel").await;
        let room = create_test_room(&pool, hotel.id, Decimal::new(10000, 2), 2).await;
        let guest = create_test_user(&pool, "guest-turnover@example.com", false).await;
        create_test_booking(&pool, room, guest.id, "2024-06-10", "2024-06-15", BookingStatus::Confirmed).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Rooms::new(&mut conn);

        // Check-in on the existing checkout day.
        let free = repo.find_available(RoomSearchScope::Hotel(hotel.id), &query("2024-06-15", "2024-06-18", 2)).await.unwrap();
        assert_eq!(free.len(), 1);

        // Check-out on the existing check-in day.
        let free = repo.find_available(RoomSearchScope::Hotel(hotel.id), &query("2024-06-08", "2024-06-10", 2)).await.unwrap();
        assert_eq!(free.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_non_confirmed_bookings_do_not_block(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Pending Hotel").await;
        let room = create_test_room(&pool, hotel.id, Decimal::new(10000, 2), 2).await;
        let guest = create_test_user(&pool, "guest-pending@example.com", false).await;
        create_test_booking(&pool, room, guest.id, "2024-06-10", "2024-06-15", BookingStatus::Pending).await;
        create_test_booking(&pool, room, guest.id, "2024-06-10", "2024-06-15", BookingStatus::Canceled).await;
        create_test_booking(&pool, room, guest.id, "2024-06-10", "2024-06-15", BookingStatus::Rejected).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Rooms::new(&mut conn);

        let free = repo.find_available(RoomSearchScope::Hotel(hotel.id), &query("2024-06-10", "2024-06-15", 2)).await.unwrap();
        assert_eq!(free.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_capacity_filter_is_inclusive(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Capacity Hotel").await;
        create_test_room(&pool, hotel.id, Decimal::new(10000, 2), 2).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Rooms::new(&mut conn);

        // Exactly at capacity is allowed, one over is not.
        let free = repo.find_available(RoomSearchScope::Hotel(hotel.id), &query("2024-06-10", "2024-06-12", 2)).await.unwrap();
        assert_eq!(free.len(), 1);

        let free = repo.find_available(RoomSearchScope::Hotel(hotel.id), &query("2024-06-10", "2024-06-12", 3)).await.unwrap();
        assert!(free.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_city_category_and_global_scopes(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Scoped Hotel").await;
        let other = create_test_hotel(&pool, "Other Hotel").await;
        let room = create_test_room(&pool, hotel.id, Decimal::new(10000, 2), 2).await;
        create_test_room(&pool, other.id, Decimal::new(10000, 2), 2).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Rooms::new(&mut conn);
        let stay = query("2024-06-10", "2024-06-12", 2);

        // Each test hotel gets its own city and category.
        let free = repo.find_available(RoomSearchScope::City(hotel.city_id), &stay).await.unwrap();
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].id, room);

        let free = repo.find_available(RoomSearchScope::Category(hotel.category_id), &stay).await.unwrap();
        assert_eq!(free.len(), 1);

        let free = repo.find_available(RoomSearchScope::All, &stay).await.unwrap();
        assert_eq!(free.len(), 2);
    }
}
