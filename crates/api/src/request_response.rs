// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request and response types for API operations.
//!
//! Timestamps cross this boundary as naive-UTC `YYYY-MM-DD HH:MM:SS`
//! strings, matching the storage format.

use crate::error::ApiError;
use resv_domain::{Booking, format_instant};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Request to create a booking (or series).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    /// The resource to book.
    pub resource_id: i64,
    /// Booking date, `YYYY-MM-DD`.
    pub date: String,
    /// Start of day time, `HH:MM`.
    pub start_time: String,
    /// End of day time, `HH:MM`.
    pub end_time: String,
    /// Booking title.
    pub title: String,
    /// Optional recurrence rule, e.g. `FREQ=WEEKLY;COUNT=5`.
    pub recurrence_rule: Option<String>,
}

/// Request to change a booking's window and/or title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookingRequest {
    /// The booking to change.
    pub booking_id: i64,
    /// New title; `None` keeps the current one.
    pub new_title: Option<String>,
    /// New date, `YYYY-MM-DD`; must be given together with both times.
    pub new_date: Option<String>,
    /// New start time, `HH:MM`.
    pub new_start_time: Option<String>,
    /// New end time, `HH:MM`.
    pub new_end_time: Option<String>,
}

/// A booking as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInfo {
    /// The booking id.
    pub booking_id: i64,
    /// The booked resource.
    pub resource_id: i64,
    /// The owning user.
    pub user_name: String,
    /// Booking title.
    pub title: String,
    /// Start instant.
    pub start_time: String,
    /// End instant.
    pub end_time: String,
    /// Current status, snake_case.
    pub status: String,
    /// Recurrence rule shared by the series, if any.
    pub recurrence_rule: Option<String>,
    /// Admin message attached on cancellation, if any.
    pub admin_message: Option<String>,
    /// Recorded check-in instant, if any.
    pub checked_in_at: Option<String>,
    /// Recorded check-out instant, if any.
    pub checked_out_at: Option<String>,
    /// Check-in token, present until consumed or cleared.
    pub check_in_token: Option<String>,
    /// Token expiry instant, if a token is set.
    pub token_expires_at: Option<String>,
}

impl BookingInfo {
    /// Builds the response form of a booking.
    ///
    /// # Errors
    ///
    /// Returns an internal error if an instant cannot be formatted.
    pub fn from_booking(booking: &Booking) -> Result<Self, ApiError> {
        Ok(Self {
            booking_id: booking.id,
            resource_id: booking.resource_id,
            user_name: booking.user_name.clone(),
            title: booking.title.clone(),
            start_time: render_instant(booking.slot.start())?,
            end_time: render_instant(booking.slot.end())?,
            status: booking.status.as_str().to_string(),
            recurrence_rule: booking.recurrence_rule.clone(),
            admin_message: booking.admin_message.clone(),
            checked_in_at: booking.checked_in_at.map(render_instant).transpose()?,
            checked_out_at: booking.checked_out_at.map(render_instant).transpose()?,
            check_in_token: booking.check_in_token.clone(),
            token_expires_at: booking.token_expires_at.map(render_instant).transpose()?,
        })
    }
}

/// Response to a successful booking creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    /// The created bookings, one per occurrence.
    pub bookings: Vec<BookingInfo>,
}

/// Response to a booking deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBookingResponse {
    /// User promoted from the waitlist, if any.
    pub promoted_user: Option<String>,
}

/// Response to a check-in, by whichever path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInResponse {
    /// The checked-in booking.
    pub booking_id: i64,
    /// The recorded check-in instant.
    pub checked_in_at: String,
    /// True when this invocation found the check-in already recorded.
    pub already_checked_in: bool,
}

/// Response to a check-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutResponse {
    /// The checked-out booking.
    pub booking_id: i64,
    /// The recorded check-out instant.
    pub checked_out_at: String,
    /// True when this invocation found the check-out already recorded.
    pub already_checked_out: bool,
}

/// Response to the stale-pending sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelStalePendingResponse {
    /// Number of pending bookings cancelled by this sweep.
    pub cancelled: usize,
}

pub(crate) fn render_instant(instant: OffsetDateTime) -> Result<String, ApiError> {
    format_instant(instant).map_err(|e| ApiError::Internal {
        message: format!("failed to format instant: {e}"),
    })
}
