//! User repository.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::errors::Result;
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest};
use crate::types::UserId;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (id, username, email, display_name, is_staff)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, display_name, is_staff, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(request.is_staff)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT id, username, email, display_name, is_staff, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT id, username, email, display_name, is_staff, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self, request), err)]
    pub async fn update(&mut self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                is_staff = COALESCE($3, is_staff),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, display_name, is_staff, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&request.display_name)
        .bind(request.is_staff)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn request(email: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            username: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            display_name: None,
            is_staff: false,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_lookup_by_email(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&request("guest@example.com")).await.unwrap();
        assert!(!created.is_staff);

        let found = repo.get_by_email("guest@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_email_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&request("dup@example.com")).await.unwrap();
        let mut second = request("dup@example.com");
        second.username = "dup2".to_string();
        let err = repo.create(&second).await.unwrap_err();
        assert!(matches!(err, crate::db::errors::DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_promotes_to_staff(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&request("promote@example.com")).await.unwrap();
        let updated = repo
            .update(
                created.id,
                &UserUpdateDBRequest {
                    display_name: None,
                    is_staff: Some(true),
                },
            )
            .await
            .unwrap();
        assert!(updated.is_staff);
        assert_eq!(updated.display_name, None);
    }
}
