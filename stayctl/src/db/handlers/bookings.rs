//! Booking repository.
//!
//! Overlap semantics are half-open: a booking `[check_in, check_out)` leaves
//! its checkout day free. The application checks availability before inserting
//! (inside one transaction), and the `bookings_confirmed_no_overlap` exclusion
//! constraint backstops the check under concurrency: when two conflicting
//! Confirmed inserts race, exactly one commits and the other surfaces as
//! [`DbError::ExclusionViolation`].

use sqlx::PgConnection;
use tracing::instrument;

use crate::api::models::bookings::BookingStatus;
use crate::availability::StayRange;
use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::bookings::{BookingCreateDBRequest, BookingDBResponse, BookingFilter, BookingRow};
use crate::types::{BookingId, RoomId};

const BOOKING_COLUMNS: &str = r#"
    b.id,
    b.room_id,
    r.name AS room_name,
    h.name AS hotel_name,
    b.author_id,
    b.check_in,
    b.check_out,
    b.num_guests,
    b.special_request,
    b.status,
    (r.price * (b.check_out - b.check_in))::NUMERIC AS total_price,
    b.created_at,
    b.updated_at
"#;

pub struct Bookings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Bookings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Whether any Confirmed booking for the room overlaps the range.
    ///
    /// `exclude` skips one booking, used when re-validating an existing
    /// Pending booking on confirmation (it must not conflict with itself).
    #[instrument(skip(self), err)]
    pub async fn has_confirmed_overlap(
        &mut self,
        room_id: RoomId,
        range: &StayRange,
        exclude: Option<BookingId>,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM bookings
                WHERE room_id = $1
                  AND status = $2
                  AND check_in < $4
                  AND check_out > $3
                  AND ($5::uuid IS NULL OR id <> $5)
            )
            "#,
        )
        .bind(room_id)
        .bind(BookingStatus::Confirmed.as_str())
        .bind(range.check_in)
        .bind(range.check_out)
        .bind(exclude)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(exists)
    }

    /// Read a booking's current status, locking the row until the surrounding
    /// transaction ends. Status transitions go through this to serialize
    /// concurrent updates to the same booking.
    #[instrument(skip(self), err)]
    pub async fn get_status_for_update(&mut self, id: BookingId) -> Result<Option<BookingStatus>> {
        let status = sqlx::query_scalar::<_, String>(
            r#"
            SELECT status
            FROM bookings
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        status
            .map(|s| s.parse::<BookingStatus>().map_err(|e| DbError::Other(anyhow::anyhow!(e))))
            .transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn update_status(&mut self, id: BookingId, status: BookingStatus) -> Result<BookingDBResponse> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings b
            SET status = $2, updated_at = NOW()
            FROM rooms r
            JOIN hotels h ON h.id = r.hotel_id
            WHERE b.id = $1 AND r.id = b.room_id
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(row.try_into()?)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &BookingFilter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM bookings
            WHERE ($1::uuid IS NULL OR author_id = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(filter.author_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_one(&mut *self.db)
        .await?;
        Ok(count)
    }

    /// The status names seeded in `booking_statuses`. Startup validation
    /// checks the closed vocabulary is intact before serving traffic.
    #[instrument(skip(self), err)]
    pub async fn list_status_vocabulary(&mut self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM booking_statuses ORDER BY name")
            .fetch_all(&mut *self.db)
            .await?;
        Ok(names)
    }
}

#[async_trait::async_trait]
impl Repository for Bookings<'_> {
    type CreateRequest = BookingCreateDBRequest;
    type Response = BookingDBResponse;
    type Id = BookingId;
    type Filter = BookingFilter;

    #[instrument(skip(self, request), fields(room_id = %request.room_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, room_id, author_id, check_in, check_out, num_guests, special_request, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(request.id)
        .bind(request.room_id)
        .bind(request.author_id)
        .bind(request.check_in)
        .bind(request.check_out)
        .bind(request.num_guests)
        .bind(&request.special_request)
        .bind(request.status.as_str())
        .execute(&mut *self.db)
        .await?;

        self.get_by_id(request.id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            JOIN rooms r ON r.id = b.room_id
            JOIN hotels h ON h.id = r.hotel_id
            WHERE b.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        row.map(|r| r.try_into().map_err(DbError::Other)).transpose()
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            JOIN rooms r ON r.id = b.room_id
            JOIN hotels h ON h.id = r.hotel_id
            WHERE ($1::uuid IS NULL OR b.author_id = $1)
              AND ($2::text IS NULL OR b.status = $2)
            ORDER BY b.check_in DESC, b.created_at DESC
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(filter.author_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;
        rows.into_iter()
            .map(|r| r.try_into().map_err(DbError::Other))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_hotel, create_test_room, create_test_user};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn request(room_id: RoomId, author_id: Uuid, check_in: &str, check_out: &str, status: BookingStatus) -> BookingCreateDBRequest {
        BookingCreateDBRequest {
            id: Uuid::new_v4(),
            room_id,
            author_id,
            check_in: date(check_in),
            check_out: date(check_out),
            num_guests: 2,
            special_request: None,
            status,
        }
    }

    async fn setup(pool: &PgPool) -> (RoomId, Uuid) {
        let hotel = create_test_hotel(pool, &format!("Booking Hotel {}", Uuid::new_v4())).await;
        let room = create_test_room(pool, hotel.id, Decimal::new(15000, 2), 4).await;
        let guest = create_test_user(pool, &format!("guest-{}@example.com", Uuid::new_v4()), false).await;
        (room, guest.id)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_computes_total_price(pool: PgPool) {
        let (room, guest) = setup(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);

        let booking = repo
            .create(&request(room, guest, "2024-06-10", "2024-06-14", BookingStatus::Confirmed))
            .await
            .unwrap();

        // 4 nights at 150.00
        assert_eq!(booking.total_price, Decimal::new(60000, 2));
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(!booking.hotel_name.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_overlap_check_is_half_open(pool: PgPool) {
        let (room, guest) = setup(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);
        repo.create(&request(room, guest, "2024-06-10", "2024-06-15", BookingStatus::Confirmed))
            .await
            .unwrap();

        let overlapping = StayRange::new(date("2024-06-12"), date("2024-06-20"));
        assert!(repo.has_confirmed_overlap(room, &overlapping, None).await.unwrap());

        let back_to_back = StayRange::new(date("2024-06-15"), date("2024-06-18"));
        assert!(!repo.has_confirmed_overlap(room, &back_to_back, None).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_exclusion_constraint_backstops_double_booking(pool: PgPool) {
        let (room, guest) = setup(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);
        repo.create(&request(room, guest, "2024-06-10", "2024-06-15", BookingStatus::Confirmed))
            .await
            .unwrap();

        // Insert directly, without any application-side check: the database
        // still refuses the conflicting Confirmed booking.
        let err = repo
            .create(&request(room, guest, "2024-06-12", "2024-06-16", BookingStatus::Confirmed))
            .await
            .unwrap_err();
        assert!(err.is_booking_conflict(), "expected exclusion violation, got {err:?}");

        // A Pending booking for the same dates is allowed.
        repo.create(&request(room, guest, "2024-06-12", "2024-06-16", BookingStatus::Pending))
            .await
            .unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_confirmed_inserts_one_wins(pool: PgPool) {
        let (room, guest) = setup(&pool).await;

        let pool_a = pool.clone();
        let pool_b = pool.clone();
        let req_a = request(room, guest, "2024-07-01", "2024-07-05", BookingStatus::Confirmed);
        let req_b = request(room, guest, "2024-07-03", "2024-07-08", BookingStatus::Confirmed);

        let task_a = tokio::spawn(async move {
            let mut conn = pool_a.acquire().await.unwrap();
            Bookings::new(&mut conn).create(&req_a).await
        });
        let task_b = tokio::spawn(async move {
            let mut conn = pool_b.acquire().await.unwrap();
            Bookings::new(&mut conn).create(&req_b).await
        });

        let (res_a, res_b) = tokio::join!(task_a, task_b);
        let results = [res_a.unwrap(), res_b.unwrap()];
        let ok_count = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok_count, 1, "exactly one of two racing bookings must win");
        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert!(loser.as_ref().unwrap_err().is_booking_conflict());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cancellation_frees_the_dates(pool: PgPool) {
        let (room, guest) = setup(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);
        let booking = repo
            .create(&request(room, guest, "2024-06-10", "2024-06-15", BookingStatus::Confirmed))
            .await
            .unwrap();

        repo.update_status(booking.id, BookingStatus::Canceled).await.unwrap();

        let range = StayRange::new(date("2024-06-10"), date("2024-06-15"));
        assert!(!repo.has_confirmed_overlap(room, &range, None).await.unwrap());

        // And the dates can be booked again.
        repo.create(&request(room, guest, "2024-06-10", "2024-06-15", BookingStatus::Confirmed))
            .await
            .unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_exclude_skips_own_booking_on_revalidation(pool: PgPool) {
        let (room, guest) = setup(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);
        let booking = repo
            .create(&request(room, guest, "2024-06-10", "2024-06-15", BookingStatus::Confirmed))
            .await
            .unwrap();

        let range = StayRange::new(date("2024-06-10"), date("2024-06-15"));
        assert!(repo.has_confirmed_overlap(room, &range, None).await.unwrap());
        assert!(!repo.has_confirmed_overlap(room, &range, Some(booking.id)).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_author_and_status(pool: PgPool) {
        let (room, guest) = setup(&pool).await;
        let (other_room, other_guest) = setup(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);
        repo.create(&request(room, guest, "2024-06-10", "2024-06-12", BookingStatus::Confirmed))
            .await
            .unwrap();
        repo.create(&request(room, guest, "2024-07-10", "2024-07-12", BookingStatus::Pending))
            .await
            .unwrap();
        repo.create(&request(other_room, other_guest, "2024-06-10", "2024-06-12", BookingStatus::Confirmed))
            .await
            .unwrap();

        let filter = BookingFilter {
            author_id: Some(guest),
            status: None,
            skip: 0,
            limit: 20,
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        let filter = BookingFilter {
            author_id: Some(guest),
            status: Some(BookingStatus::Pending),
            skip: 0,
            limit: 20,
        };
        let pending = repo.list(&filter).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, BookingStatus::Pending);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_status_vocabulary_is_seeded(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);

        let names = repo.list_status_vocabulary().await.unwrap();
        for status in BookingStatus::ALL {
            assert!(names.iter().any(|n| n == status.as_str()), "missing {status}");
        }
    }
}
