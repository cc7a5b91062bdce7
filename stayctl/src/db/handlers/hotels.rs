//! Hotel repository: browse listings and detail, with aggregates computed in SQL.

use sqlx::PgConnection;
use tracing::instrument;

use crate::api::models::bookings::BookingStatus;
use crate::db::errors::Result;
use crate::db::models::hotels::{HotelCardDBResponse, HotelDBResponse, HotelListDBFilter};
use crate::types::{HotelId, UserId};

pub struct Hotels<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Hotels<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// List hotels for the browse page.
    ///
    /// Aggregates (cheapest room, average rating, favourite flag) are computed
    /// per row. With an availability query, hotels are additionally restricted
    /// to those with at least one free room that fits the party, and
    /// `available_rooms` carries the count.
    #[instrument(skip(self, filter), err)]
    pub async fn list(&mut self, filter: &HotelListDBFilter) -> Result<Vec<HotelCardDBResponse>> {
        let rows = match &filter.availability {
            Some(availability) => {
                sqlx::query_as::<_, HotelCardDBResponse>(
                    r#"
                    SELECT h.id,
                           h.name,
                           h.stars,
                           ci.name AS city,
                           cat.name AS category,
                           (SELECT MIN(r.price) FROM rooms r WHERE r.hotel_id = h.id) AS min_price,
                           (SELECT COUNT(*)
                            FROM rooms r
                            WHERE r.hotel_id = h.id
                              AND r.capacity >= $4
                              AND NOT EXISTS (
                                  SELECT 1 FROM bookings b
                                  WHERE b.room_id = r.id
                                    AND b.status = $5
                                    AND b.check_in < $7
                                    AND b.check_out > $6
                              )) AS available_rooms,
                           (SELECT AVG(hr.value)::DOUBLE PRECISION FROM hotel_ratings hr WHERE hr.hotel_id = h.id) AS avg_rating,
                           (SELECT COUNT(*) FROM hotel_ratings hr WHERE hr.hotel_id = h.id) AS ratings_count,
                           EXISTS (SELECT 1 FROM user_favourites f WHERE f.hotel_id = h.id AND f.user_id = $8) AS is_favourite
                    FROM hotels h
                    JOIN cities ci ON ci.id = h.city_id
                    JOIN categories cat ON cat.id = h.category_id
                    WHERE ($1::uuid IS NULL OR h.city_id = $1)
                      AND ($2::uuid IS NULL OR h.category_id = $2)
                      AND ($3::text IS NULL OR h.name ILIKE '%' || $3 || '%')
                      AND EXISTS (
                          SELECT 1 FROM rooms r
                          WHERE r.hotel_id = h.id
                            AND r.capacity >= $4
                            AND NOT EXISTS (
                                SELECT 1 FROM bookings b
                                WHERE b.room_id = r.id
                                  AND b.status = $5
                                  AND b.check_in < $7
                                  AND b.check_out > $6
                            )
                      )
                    ORDER BY h.name
                    OFFSET $9 LIMIT $10
                    "#,
                )
                .bind(filter.city_id)
                .bind(filter.category_id)
                .bind(&filter.search)
                .bind(availability.num_guests)
                .bind(BookingStatus::Confirmed.as_str())
                .bind(availability.check_in)
                .bind(availability.check_out)
                .bind(filter.viewer_id)
                .bind(filter.skip)
                .bind(filter.limit)
                .fetch_all(&mut *self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, HotelCardDBResponse>(
                    r#"
                    SELECT h.id,
                           h.name,
                           h.stars,
                           ci.name AS city,
                           cat.name AS category,
                           (SELECT MIN(r.price) FROM rooms r WHERE r.hotel_id = h.id) AS min_price,
                           NULL::BIGINT AS available_rooms,
                           (SELECT AVG(hr.value)::DOUBLE PRECISION FROM hotel_ratings hr WHERE hr.hotel_id = h.id) AS avg_rating,
                           (SELECT COUNT(*) FROM hotel_ratings hr WHERE hr.hotel_id = h.id) AS ratings_count,
                           EXISTS (SELECT 1 FROM user_favourites f WHERE f.hotel_id = h.id AND f.user_id = $4) AS is_favourite
                    FROM hotels h
                    JOIN cities ci ON ci.id = h.city_id
                    JOIN categories cat ON cat.id = h.category_id
                    WHERE ($1::uuid IS NULL OR h.city_id = $1)
                      AND ($2::uuid IS NULL OR h.category_id = $2)
                      AND ($3::text IS NULL OR h.name ILIKE '%' || $3 || '%')
                    ORDER BY h.name
                    OFFSET $5 LIMIT $6
                    "#,
                )
                .bind(filter.city_id)
                .bind(filter.category_id)
                .bind(&filter.search)
                .bind(filter.viewer_id)
                .bind(filter.skip)
                .bind(filter.limit)
                .fetch_all(&mut *self.db)
                .await?
            }
        };
        Ok(rows)
    }

    /// Total hotels matching the filter, ignoring pagination.
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &HotelListDBFilter) -> Result<i64> {
        let count = match &filter.availability {
            Some(availability) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COUNT(*)
                    FROM hotels h
                    WHERE ($1::uuid IS NULL OR h.city_id = $1)
                      AND ($2::uuid IS NULL OR h.category_id = $2)
                      AND ($3::text IS NULL OR h.name ILIKE '%' || $3 || '%')
                      AND EXISTS (
                          SELECT 1 FROM rooms r
                          WHERE r.hotel_id = h.id
                            AND r.capacity >= $4
                            AND NOT EXISTS (
                                SELECT 1 FROM bookings b
                                WHERE b.room_id = r.id
                                  AND b.status = $5
                                  AND b.check_in < $7
                                  AND b.check_out > $6
                            )
                      )
                    "#,
                )
                .bind(filter.city_id)
                .bind(filter.category_id)
                .bind(&filter.search)
                .bind(availability.num_guests)
                .bind(BookingStatus::Confirmed.as_str())
                .bind(availability.check_in)
                .bind(availability.check_out)
                .fetch_one(&mut *self.db)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COUNT(*)
                    FROM hotels h
                    WHERE ($1::uuid IS NULL OR h.city_id = $1)
                      AND ($2::uuid IS NULL OR h.category_id = $2)
                      AND ($3::text IS NULL OR h.name ILIKE '%' || $3 || '%')
                    "#,
                )
                .bind(filter.city_id)
                .bind(filter.category_id)
                .bind(&filter.search)
                .fetch_one(&mut *self.db)
                .await?
            }
        };
        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: HotelId) -> Result<Option<HotelDBResponse>> {
        let hotel = sqlx::query_as::<_, HotelDBResponse>(
            r#"
            SELECT h.id,
                   h.name,
                   h.description,
                   h.address,
                   h.stars,
                   ci.name AS city,
                   p.name AS province,
                   co.name AS country,
                   cat.name AS category,
                   (SELECT AVG(hr.value)::DOUBLE PRECISION FROM hotel_ratings hr WHERE hr.hotel_id = h.id) AS avg_rating,
                   (SELECT COUNT(*) FROM hotel_ratings hr WHERE hr.hotel_id = h.id) AS ratings_count
            FROM hotels h
            JOIN cities ci ON ci.id = h.city_id
            JOIN provinces p ON p.id = ci.province_id
            JOIN countries co ON co.id = p.country_id
            JOIN categories cat ON cat.id = h.category_id
            WHERE h.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(hotel)
    }

    #[instrument(skip(self), err)]
    pub async fn is_favourite(&mut self, hotel_id: HotelId, user_id: UserId) -> Result<bool> {
        let favourite = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_favourites
                WHERE hotel_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(hotel_id)
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(favourite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::AvailabilityQuery;
    use crate::test_utils::{create_test_booking, create_test_hotel, create_test_room, create_test_user};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn filter(viewer_id: UserId) -> HotelListDBFilter {
        HotelListDBFilter {
            city_id: None,
            category_id: None,
            search: None,
            availability: None,
            viewer_id,
            skip: 0,
            limit: 20,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_includes_min_price_and_counts(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Aggregate Hotel").await;
        create_test_room(&pool, hotel.id, Decimal::new(20000, 2), 2).await;
        create_test_room(&pool, hotel.id, Decimal::new(9900, 2), 4).await;
        let viewer = create_test_user(&pool, "viewer@example.com", false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Hotels::new(&mut conn);

        let cards = repo.list(&filter(viewer.id)).await.unwrap();
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.min_price, Some(Decimal::new(9900, 2)));
        assert_eq!(card.available_rooms, None);
        assert_eq!(card.ratings_count, 0);
        assert!(!card.is_favourite);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_availability_filter_excludes_fully_booked_hotels(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Booked Out Hotel").await;
        let room = create_test_room(&pool, hotel.id, Decimal::new(10000, 2), 2).await;
        let guest = create_test_user(&pool, "booker@example.com", false).await;
        create_test_booking(
            &pool,
            room,
            guest.id,
            "2024-06-10",
            "2024-06-15",
            crate::api::models::bookings::BookingStatus::Confirmed,
        )
        .await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Hotels::new(&mut conn);

        let mut with_dates = filter(guest.id);
        with_dates.availability = Some(AvailabilityQuery {
            check_in: date("2024-06-12"),
            check_out: date("2024-06-14"),
            num_guests: 2,
        });
        assert!(repo.list(&with_dates).await.unwrap().is_empty());
        assert_eq!(repo.count(&with_dates).await.unwrap(), 0);

        with_dates.availability = Some(AvailabilityQuery {
            check_in: date("2024-06-15"),
            check_out: date("2024-06-18"),
            num_guests: 2,
        });
        let cards = repo.list(&with_dates).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].available_rooms, Some(1));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_matches_name_case_insensitively(pool: PgPool) {
        create_test_hotel(&pool, "Grand Plaza").await;
        create_test_hotel(&pool, "Seaside Inn").await;
        let viewer = create_test_user(&pool, "searcher@example.com", false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Hotels::new(&mut conn);

        let mut search = filter(viewer.id);
        search.search = Some("plaza".to_string());
        let cards = repo.list(&search).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "Grand Plaza");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_detail_includes_location_chain(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Detail Hotel").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Hotels::new(&mut conn);

        let detail = repo.get_by_id(hotel.id).await.unwrap().unwrap();
        assert_eq!(detail.name, "Detail Hotel");
        assert!(!detail.city.is_empty());
        assert!(!detail.province.is_empty());
        assert!(!detail.country.is_empty());

        assert!(repo.get_by_id(uuid::Uuid::new_v4()).await.unwrap().is_none());
    }
}
