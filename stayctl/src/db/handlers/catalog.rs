//! Catalog repository: categories and cities for browse filters.

use sqlx::PgConnection;
use tracing::instrument;

use crate::api::models::bookings::BookingStatus;
use crate::availability::AvailabilityQuery;
use crate::db::errors::Result;
use crate::db::models::catalog::{CategoryCountDBResponse, CityCountDBResponse};

pub struct Catalog<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Catalog<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Categories with their hotel counts, alphabetical. Empty categories are
    /// included so the browse filter list is complete.
    ///
    /// With an availability query, a hotel only counts when at least one of
    /// its rooms fits the party and is free for the whole range.
    #[instrument(skip(self, availability), err)]
    pub async fn list_categories(
        &mut self,
        availability: Option<&AvailabilityQuery>,
    ) -> Result<Vec<CategoryCountDBResponse>> {
        let rows = match availability {
            None => {
                sqlx::query_as::<_, CategoryCountDBResponse>(
                    r#"
                    SELECT c.id, c.name, COUNT(h.id) AS hotel_count
                    FROM categories c
                    LEFT JOIN hotels h ON h.category_id = c.id
                    GROUP BY c.id, c.name
                    ORDER BY c.name
                    "#,
                )
                .fetch_all(&mut *self.db)
                .await?
            }
            Some(query) => {
                sqlx::query_as::<_, CategoryCountDBResponse>(
                    r#"
                    SELECT c.id, c.name, COUNT(h.id) AS hotel_count
                    FROM categories c
                    LEFT JOIN hotels h ON h.category_id = c.id
                        AND EXISTS (
                            SELECT 1
                            FROM rooms r
                            WHERE r.hotel_id = h.id
                              AND r.capacity >= $1
                              AND NOT EXISTS (
                                  SELECT 1
                                  FROM bookings b
                                  WHERE b.room_id = r.id
                                    AND b.status = $2
                                    AND b.check_in < $4
                                    AND b.check_out > $3
                              )
                        )
                    GROUP BY c.id, c.name
                    ORDER BY c.name
                    "#,
                )
                .bind(query.num_guests)
                .bind(BookingStatus::Confirmed.as_str())
                .bind(query.check_in)
                .bind(query.check_out)
                .fetch_all(&mut *self.db)
                .await?
            }
        };
        Ok(rows)
    }

    /// Cities that have at least one hotel, with province and country names.
    #[instrument(skip(self), err)]
    pub async fn list_cities(&mut self) -> Result<Vec<CityCountDBResponse>> {
        let rows = sqlx::query_as::<_, CityCountDBResponse>(
            r#"
            SELECT ci.id,
                   ci.name,
                   p.name AS province,
                   co.name AS country,
                   COUNT(h.id) AS hotel_count
            FROM cities ci
            JOIN provinces p ON p.id = ci.province_id
            JOIN countries co ON co.id = p.country_id
            JOIN hotels h ON h.city_id = ci.id
            GROUP BY ci.id, ci.name, p.name, co.name
            ORDER BY co.name, p.name, ci.name
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(rows)
    }
}
