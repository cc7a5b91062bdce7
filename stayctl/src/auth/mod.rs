//! Authentication.
//!
//! Identity comes from a trusted HTTP header set by an upstream proxy (for
//! example oauth2-proxy). The header value is the caller's email address;
//! unknown emails are auto-created as guest users when
//! `auth.auto_create_users` is enabled.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    db::{
        errors::DbError,
        handlers::Users,
        models::users::UserCreateDBRequest,
    },
    errors::{Error, Result},
    types::abbrev_uuid,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use tracing::{debug, instrument, trace};

/// Extract user from the identity header if present.
/// Returns:
/// - None: No identity header present
/// - Some(Ok(user)): Header found and user resolved (or auto-created)
/// - Some(Err(error)): Header present but user lookup/creation failed
#[instrument(skip(parts, config, db))]
async fn try_proxy_header_auth(
    parts: &Parts,
    config: &crate::config::Config,
    db: &PgPool,
) -> Option<Result<CurrentUser>> {
    let user_email = match parts
        .headers
        .get(&config.auth.identity_header)
        .and_then(|h| h.to_str().ok())
    {
        Some(email) => email,
        None => return None,
    };

    let mut tx = match db.begin().await {
        Ok(tx) => tx,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };
    let mut user_repo = Users::new(&mut tx);

    let user_result = match user_repo.get_by_email(user_email).await {
        Ok(Some(user)) => Some(CurrentUser::from(user)),
        Ok(None) => {
            if config.auth.auto_create_users {
                let create_request = UserCreateDBRequest {
                    username: user_email.to_string(),
                    email: user_email.to_string(),
                    display_name: None,
                    is_staff: false,
                };

                match user_repo.create(&create_request).await {
                    Ok(new_user) => Some(CurrentUser::from(new_user)),
                    Err(e) => return Some(Err(Error::Database(e))),
                }
            } else {
                None
            }
        }
        Err(e) => return Some(Err(Error::Database(e))),
    };

    match tx.commit().await {
        Ok(_) => {}
        Err(e) => return Some(Err(DbError::from(e).into())),
    }
    user_result.map(Ok)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match try_proxy_header_auth(parts, &state.config, &state.db).await {
            Some(Ok(user)) => {
                debug!("Found proxy header authenticated user: {}", abbrev_uuid(&user.id));
                Ok(user)
            }
            Some(Err(e)) => Err(e),
            None => {
                trace!("No identity header on request");
                Err(Error::Unauthenticated {
                    message: Some("Authentication required".to_string()),
                })
            }
        }
    }
}

/// Extractor that additionally requires the caller to be staff.
#[derive(Debug, Clone)]
pub struct Staff(pub CurrentUser);

impl FromRequestParts<AppState> for Staff {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(Error::Forbidden {
                action: "manage bookings".to_string(),
            });
        }
        Ok(Staff(user))
    }
}
