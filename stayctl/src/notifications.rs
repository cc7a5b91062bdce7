//! Booking status change notifications.
//!
//! Emails are fire-and-forget: the status update has already committed, so a
//! transport failure is logged and never surfaced to the API caller.

use tracing::{debug, error};

use crate::db::models::bookings::BookingDBResponse;
use crate::db::models::users::UserDBResponse;
use crate::AppState;

/// Notify the booking's author that staff changed its status.
///
/// No-op when email is disabled in the configuration.
pub fn notify_status_change(state: &AppState, booking: &BookingDBResponse, recipient: &UserDBResponse) {
    let Some(email_service) = state.email.clone() else {
        debug!("Email notifications disabled, skipping booking status email");
        return;
    };

    let booking = booking.clone();
    let recipient = recipient.clone();
    tokio::spawn(async move {
        let result = email_service
            .send_booking_status_email(
                &recipient.email,
                recipient.display_name.as_deref(),
                &booking.hotel_name,
                &booking.room_name,
                booking.check_in,
                booking.check_out,
                booking.status,
            )
            .await;
        if let Err(e) = result {
            error!(
                booking_id = %booking.id,
                recipient = %recipient.email,
                "Failed to send booking status email: {e:#}"
            );
        } else {
            debug!(booking_id = %booking.id, "Sent booking status email");
        }
    });
}
