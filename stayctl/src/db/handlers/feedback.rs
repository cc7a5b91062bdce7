//! Feedback repository: ratings, reviews and favourites.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::errors::Result;
use crate::db::models::feedback::{
    AuthorReviewDBResponse, RatingAggregateDBResponse, RatingDBResponse, RatingUpsertDBRequest, ReviewCreateDBRequest,
    ReviewDBResponse,
};
use crate::db::models::hotels::HotelCardDBResponse;
use crate::types::{HotelId, ReviewId, UserId};

pub struct Feedback<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Feedback<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert or replace the caller's rating for a hotel. One rating per
    /// user per hotel is enforced by `hotel_ratings_one_per_user`; the upsert
    /// makes re-rating idempotent instead of an error.
    #[instrument(skip(self, request), fields(hotel_id = %request.hotel_id), err)]
    pub async fn upsert_rating(&mut self, request: &RatingUpsertDBRequest) -> Result<RatingDBResponse> {
        let rating = sqlx::query_as::<_, RatingDBResponse>(
            r#"
            INSERT INTO hotel_ratings (id, hotel_id, author_id, value)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (hotel_id, author_id)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING id, hotel_id, author_id, value
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.hotel_id)
        .bind(request.author_id)
        .bind(request.value)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(rating)
    }

    /// The rating a user gave a hotel, if any.
    #[instrument(skip(self), err)]
    pub async fn get_rating(&mut self, hotel_id: HotelId, author_id: UserId) -> Result<Option<RatingDBResponse>> {
        let rating = sqlx::query_as::<_, RatingDBResponse>(
            r#"
            SELECT id, hotel_id, author_id, value
            FROM hotel_ratings
            WHERE hotel_id = $1 AND author_id = $2
            "#,
        )
        .bind(hotel_id)
        .bind(author_id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(rating)
    }

    #[instrument(skip(self), err)]
    pub async fn rating_aggregate(&mut self, hotel_id: HotelId) -> Result<RatingAggregateDBResponse> {
        let aggregate = sqlx::query_as::<_, RatingAggregateDBResponse>(
            r#"
            SELECT AVG(value)::DOUBLE PRECISION AS avg_rating,
                   COUNT(*) AS ratings_count
            FROM hotel_ratings
            WHERE hotel_id = $1
            "#,
        )
        .bind(hotel_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(aggregate)
    }

    #[instrument(skip(self, request), fields(hotel_id = %request.hotel_id), err)]
    pub async fn create_review(&mut self, request: &ReviewCreateDBRequest) -> Result<ReviewDBResponse> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO hotel_reviews (id, hotel_id, author_id, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.hotel_id)
        .bind(request.author_id)
        .bind(&request.comment)
        .fetch_one(&mut *self.db)
        .await?;

        self.get_review_by_id(id)
            .await?
            .ok_or(crate::db::errors::DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    pub async fn get_review_by_id(&mut self, id: ReviewId) -> Result<Option<ReviewDBResponse>> {
        let review = sqlx::query_as::<_, ReviewDBResponse>(
            r#"
            SELECT rv.id, rv.hotel_id, rv.author_id, u.username AS author_username, rv.comment, rv.created_at
            FROM hotel_reviews rv
            JOIN users u ON u.id = rv.author_id
            WHERE rv.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(review)
    }

    #[instrument(skip(self), err)]
    pub async fn list_reviews(&mut self, hotel_id: HotelId, skip: i64, limit: i64) -> Result<Vec<ReviewDBResponse>> {
        let reviews = sqlx::query_as::<_, ReviewDBResponse>(
            r#"
            SELECT rv.id, rv.hotel_id, rv.author_id, u.username AS author_username, rv.comment, rv.created_at
            FROM hotel_reviews rv
            JOIN users u ON u.id = rv.author_id
            WHERE rv.hotel_id = $1
            ORDER BY rv.created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(hotel_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(reviews)
    }

    /// A user's own reviews, newest first, each joined with the rating the
    /// same user gave that hotel.
    #[instrument(skip(self), err)]
    pub async fn list_reviews_by_author(&mut self, author_id: UserId) -> Result<Vec<AuthorReviewDBResponse>> {
        let reviews = sqlx::query_as::<_, AuthorReviewDBResponse>(
            r#"
            SELECT rv.id,
                   rv.hotel_id,
                   h.name AS hotel_name,
                   rv.comment,
                   rv.created_at,
                   hr.value AS rating
            FROM hotel_reviews rv
            JOIN hotels h ON h.id = rv.hotel_id
            LEFT JOIN hotel_ratings hr ON hr.hotel_id = rv.hotel_id AND hr.author_id = rv.author_id
            WHERE rv.author_id = $1
            ORDER BY rv.created_at DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(reviews)
    }

    /// Returns true when a row was deleted.
    #[instrument(skip(self), err)]
    pub async fn delete_review(&mut self, id: ReviewId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM hotel_reviews WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Toggle a hotel in the user's favourites. Returns the new state.
    #[instrument(skip(self), err)]
    pub async fn toggle_favourite(&mut self, user_id: UserId, hotel_id: HotelId) -> Result<bool> {
        let removed = sqlx::query(
            r#"
            DELETE FROM user_favourites
            WHERE user_id = $1 AND hotel_id = $2
            "#,
        )
        .bind(user_id)
        .bind(hotel_id)
        .execute(&mut *self.db)
        .await?
        .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO user_favourites (user_id, hotel_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(user_id)
        .bind(hotel_id)
        .execute(&mut *self.db)
        .await?;
        Ok(true)
    }

    /// The user's favourite hotels, shaped like browse cards.
    #[instrument(skip(self), err)]
    pub async fn list_favourites(&mut self, user_id: UserId) -> Result<Vec<HotelCardDBResponse>> {
        let cards = sqlx::query_as::<_, HotelCardDBResponse>(
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
                   TRUE AS is_favourite
            FROM user_favourites f
            JOIN hotels h ON h.id = f.hotel_id
            JOIN cities ci ON ci.id = h.city_id
            JOIN categories cat ON cat.id = h.category_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_hotel, create_test_user};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_rating_upsert_keeps_one_row_per_user(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Rated Hotel").await;
        let user = create_test_user(&pool, "rater@example.com", false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Feedback::new(&mut conn);

        repo.upsert_rating(&RatingUpsertDBRequest {
            hotel_id: hotel.id,
            author_id: user.id,
            value: 7,
        })
        .await
        .unwrap();

        // Second submission replaces the value rather than adding a row.
        repo.upsert_rating(&RatingUpsertDBRequest {
            hotel_id: hotel.id,
            author_id: user.id,
            value: 9,
        })
        .await
        .unwrap();

        let aggregate = repo.rating_aggregate(hotel.id).await.unwrap();
        assert_eq!(aggregate.ratings_count, 1);
        assert_eq!(aggregate.avg_rating, Some(9.0));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_average_over_multiple_raters(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Averaged Hotel").await;
        let alice = create_test_user(&pool, "alice@example.com", false).await;
        let bob = create_test_user(&pool, "bob@example.com", false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Feedback::new(&mut conn);

        for (user, value) in [(alice.id, 6), (bob.id, 10)] {
            repo.upsert_rating(&RatingUpsertDBRequest {
                hotel_id: hotel.id,
                author_id: user,
                value,
            })
            .await
            .unwrap();
        }

        let aggregate = repo.rating_aggregate(hotel.id).await.unwrap();
        assert_eq!(aggregate.ratings_count, 2);
        assert_eq!(aggregate.avg_rating, Some(8.0));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_review_lifecycle(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Reviewed Hotel").await;
        let user = create_test_user(&pool, "reviewer@example.com", false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Feedback::new(&mut conn);

        let review = repo
            .create_review(&ReviewCreateDBRequest {
                hotel_id: hotel.id,
                author_id: user.id,
                comment: "Lovely stay".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(review.author_username, "reviewer");

        let reviews = repo.list_reviews(hotel.id, 0, 20).await.unwrap();
        assert_eq!(reviews.len(), 1);

        assert!(repo.delete_review(review.id).await.unwrap());
        assert!(!repo.delete_review(review.id).await.unwrap());
        assert!(repo.list_reviews(hotel.id, 0, 20).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_author_reviews_join_own_rating(pool: PgPool) {
        let rated = create_test_hotel(&pool, "Rated And Reviewed").await;
        let unrated = create_test_hotel(&pool, "Only Reviewed").await;
        let user = create_test_user(&pool, "prolific@example.com", false).await;
        let other = create_test_user(&pool, "someone-else@example.com", false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Feedback::new(&mut conn);

        for hotel in [rated.id, unrated.id] {
            repo.create_review(&ReviewCreateDBRequest {
                hotel_id: hotel,
                author_id: user.id,
                comment: "Worth a note".to_string(),
            })
            .await
            .unwrap();
        }
        repo.upsert_rating(&RatingUpsertDBRequest {
            hotel_id: rated.id,
            author_id: user.id,
            value: 9,
        })
        .await
        .unwrap();
        // Another user's rating must not leak into the join.
        repo.upsert_rating(&RatingUpsertDBRequest {
            hotel_id: unrated.id,
            author_id: other.id,
            value: 2,
        })
        .await
        .unwrap();

        assert_eq!(repo.get_rating(rated.id, user.id).await.unwrap().unwrap().value, 9);
        assert!(repo.get_rating(unrated.id, user.id).await.unwrap().is_none());

        let mine = repo.list_reviews_by_author(user.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        let with_rating = mine.iter().find(|r| r.hotel_id == rated.id).unwrap();
        assert_eq!(with_rating.rating, Some(9));
        assert_eq!(with_rating.hotel_name, "Rated And Reviewed");
        let without_rating = mine.iter().find(|r| r.hotel_id == unrated.id).unwrap();
        assert_eq!(without_rating.rating, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_favourite_toggles(pool: PgPool) {
        let hotel = create_test_hotel(&pool, "Favourite Hotel").await;
        let user = create_test_user(&pool, "fan@example.com", false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Feedback::new(&mut conn);

        assert!(repo.toggle_favourite(user.id, hotel.id).await.unwrap());
        let favourites = repo.list_favourites(user.id).await.unwrap();
        assert_eq!(favourites.len(), 1);
        assert!(favourites[0].is_favourite);

        assert!(!repo.toggle_favourite(user.id, hotel.id).await.unwrap());
        assert!(repo.list_favourites(user.id).await.unwrap().is_empty());
    }
}
