//! stayctl: a hotel booking service.
//!
//! The core of the service is the availability engine and its booking
//! conflict guard: stays are half-open `[check_in, check_out)` date
//! intervals, only `Confirmed` bookings occupy a room, and a PostgreSQL
//! exclusion constraint guarantees no two confirmed bookings for the same
//! room can ever overlap, even under concurrent requests.
//!
//! Around that core sits an axum HTTP API: hotel browsing with availability
//! filters, guest bookings with a staff approval workflow, and feedback
//! (ratings, reviews, favourites). Identity comes from a trusted proxy
//! header; staff users additionally manage bookings under `/manage`.

use anyhow::Context;
use axum::{
    http::HeaderValue,
    routing::{delete, get, patch, post, put},
    Router,
};
use bon::Builder;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub mod api;
pub mod auth;
pub mod availability;
pub mod config;
pub mod db;
pub mod email;
pub mod errors;
pub mod notifications;
pub mod openapi;
pub mod telemetry;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

pub use config::Config;

use crate::api::models::bookings::BookingStatus;
use crate::config::CorsOrigin;
use crate::db::handlers::Bookings;
use crate::email::EmailService;
use crate::openapi::ApiDoc;
use crate::types::UserId;

/// Shared application state passed to all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Present only when email notifications are enabled.
    pub email: Option<Arc<EmailService>>,
}

/// Get the stayctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial staff user if it doesn't exist.
///
/// Idempotent: an existing account with the configured email is promoted to
/// staff instead of being recreated. Called during startup so there is always
/// at least one account able to manage bookings.
pub async fn create_initial_staff_user(email: &str, db: &PgPool) -> Result<UserId, sqlx::Error> {
    let existing: Option<UserId> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await?;

    if let Some(id) = existing {
        sqlx::query("UPDATE users SET is_staff = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        return Ok(id);
    }

    let id: UserId = sqlx::query_scalar(
        r#"
        INSERT INTO users (id, username, email, is_staff)
        VALUES ($1, $2, $3, TRUE)
        RETURNING id
        "#,
    )
    .bind(uuid::Uuid::new_v4())
    .bind(email)
    .bind(email)
    .fetch_one(db)
    .await?;
    Ok(id)
}

/// Check that the seeded `booking_statuses` vocabulary is intact.
///
/// The status column is a TEXT foreign key into a closed vocabulary; if a
/// migration or manual edit removed one of the four names, refusing to start
/// is better than failing on the first booking.
pub async fn validate_status_vocabulary(db: &PgPool) -> anyhow::Result<()> {
    let mut conn = db.acquire().await?;
    let names = Bookings::new(&mut conn).list_status_vocabulary().await?;
    for status in BookingStatus::ALL {
        if !names.iter().any(|n| n == status.as_str()) {
            anyhow::bail!("booking_statuses is missing '{status}'; run migrations before serving traffic");
        }
    }
    Ok(())
}

/// Connect to the database, run migrations, and seed startup data.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections())
        .connect(config.database_url())
        .await
        .context("Failed to connect to the database")?;

    migrator().run(&pool).await.context("Failed to run migrations")?;
    validate_status_vocabulary(&pool).await?;

    create_initial_staff_user(&config.staff_email, &pool)
        .await
        .context("Failed to create initial staff user")?;

    Ok(pool)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials)
        .allow_methods(tower_http::cors::AllowMethods::mirror_request())
        .allow_headers(tower_http::cors::AllowHeaders::mirror_request());

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        // Catalog
        .route("/categories", get(api::handlers::hotels::list_categories))
        .route("/cities", get(api::handlers::hotels::list_cities))
        // Hotels
        .route("/hotels", get(api::handlers::hotels::list_hotels))
        .route("/hotels/{id}", get(api::handlers::hotels::get_hotel))
        // Feedback
        .route("/hotels/{id}/rating", put(api::handlers::feedback::rate_hotel))
        .route(
            "/hotels/{id}/reviews",
            get(api::handlers::feedback::list_reviews).post(api::handlers::feedback::create_review),
        )
        .route("/hotels/{id}/favourite", put(api::handlers::feedback::toggle_favourite))
        .route("/favourites", get(api::handlers::feedback::list_favourites))
        .route("/reviews", get(api::handlers::feedback::list_my_reviews))
        .route("/reviews/{id}", delete(api::handlers::feedback::delete_review))
        // Bookings
        .route(
            "/bookings",
            post(api::handlers::bookings::create_booking).get(api::handlers::bookings::list_bookings),
        )
        .route("/bookings/quote", get(api::handlers::bookings::quote_booking))
        .route("/bookings/{id}", get(api::handlers::bookings::get_booking))
        .route("/bookings/{id}/cancel", post(api::handlers::bookings::cancel_booking))
        // Staff booking management
        .route("/manage/bookings", get(api::handlers::bookings::list_all_bookings))
        .route(
            "/manage/bookings/{id}",
            patch(api::handlers::bookings::update_booking_status),
        )
        .with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The assembled application: router, state and database pool.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application on an existing pool (used by tests).
    ///
    /// Migrations and startup seeding run either way; both are idempotent.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting stayctl with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await.context("Failed to run migrations")?;
                validate_status_vocabulary(&pool).await?;
                create_initial_staff_user(&config.staff_email, &pool)
                    .await
                    .context("Failed to create initial staff user")?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let email = if config.email.enabled {
            Some(Arc::new(EmailService::new(&config).map_err(|e| {
                anyhow::anyhow!("Failed to create email service: {e}")
            })?))
        } else {
            None
        };

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .maybe_email(email)
            .build();

        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("stayctl listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
