// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking and resource query operations.
//!
//! Overlap queries compare the stored `YYYY-MM-DD HH:MM:SS` strings
//! directly. The format is fixed-width, so lexicographic order is
//! chronological order and the indexes on the raw columns apply.

use crate::data_models::{BookingRow, ResourceRow};
use crate::diesel_schema::{bookings, resources};
use crate::error::PersistenceError;
use diesel::SqliteConnection;
use diesel::prelude::*;
use resv_domain::{Booking, BookingStatus, Resource};

/// Status strings that still occupy their time slot.
pub const ACTIVE_STATUSES: [&str; 4] = ["pending", "approved", "confirmed", "checked_in"];

/// Fetches a resource by id.
pub fn get_resource(
    conn: &mut SqliteConnection,
    resource_id: i64,
) -> Result<Resource, PersistenceError> {
    resources::table
        .filter(resources::resource_id.eq(resource_id))
        .first::<ResourceRow>(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("get_resource: {e}")))?
        .ok_or(PersistenceError::ResourceNotFound(resource_id))
        .and_then(Resource::try_from)
}

/// Fetches all resources, ordered by id.
pub fn list_resources(conn: &mut SqliteConnection) -> Result<Vec<Resource>, PersistenceError> {
    resources::table
        .order(resources::resource_id.asc())
        .load::<ResourceRow>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_resources: {e}")))?
        .into_iter()
        .map(Resource::try_from)
        .collect()
}

/// Fetches a booking by id.
pub fn get_booking(
    conn: &mut SqliteConnection,
    booking_id: i64,
) -> Result<Booking, PersistenceError> {
    bookings::table
        .filter(bookings::booking_id.eq(booking_id))
        .first::<BookingRow>(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("get_booking: {e}")))?
        .ok_or(PersistenceError::BookingNotFound(booking_id))
        .and_then(Booking::try_from)
}

/// Active bookings on a resource that overlap the given window.
///
/// Strict overlap: a booking ending exactly when the window starts (or
/// starting exactly when it ends) is not returned.
pub fn active_bookings_overlapping(
    conn: &mut SqliteConnection,
    resource_id: i64,
    window_start: &str,
    window_end: &str,
) -> Result<Vec<Booking>, PersistenceError> {
    bookings::table
        .filter(bookings::resource_id.eq(resource_id))
        .filter(bookings::status.eq_any(ACTIVE_STATUSES))
        .filter(bookings::start_time.lt(window_end))
        .filter(bookings::end_time.gt(window_start))
        .order(bookings::start_time.asc())
        .load::<BookingRow>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("active_bookings_overlapping: {e}")))?
        .into_iter()
        .map(Booking::try_from)
        .collect()
}

/// Active bookings held by a user on resources other than the given one,
/// overlapping the given window. Feeds the concurrent-resource policy.
pub fn user_bookings_elsewhere_overlapping(
    conn: &mut SqliteConnection,
    user_name: &str,
    exclude_resource_id: i64,
    window_start: &str,
    window_end: &str,
) -> Result<Vec<Booking>, PersistenceError> {
    bookings::table
        .filter(bookings::user_name.eq(user_name))
        .filter(bookings::resource_id.ne(exclude_resource_id))
        .filter(bookings::status.eq_any(ACTIVE_STATUSES))
        .filter(bookings::start_time.lt(window_end))
        .filter(bookings::end_time.gt(window_start))
        .load::<BookingRow>(conn)
        .map_err(|e| {
            PersistenceError::QueryFailed(format!("user_bookings_elsewhere_overlapping: {e}"))
        })?
        .into_iter()
        .map(Booking::try_from)
        .collect()
}

/// Count of a user's currently active bookings across all resources.
///
/// Only bookings that have not yet ended are counted; a fully elapsed
/// booking no longer occupies quota even if its status is still active.
pub fn user_active_booking_count(
    conn: &mut SqliteConnection,
    user_name: &str,
    now: &str,
) -> Result<u32, PersistenceError> {
    let count: i64 = bookings::table
        .filter(bookings::user_name.eq(user_name))
        .filter(bookings::status.eq_any(ACTIVE_STATUSES))
        .filter(bookings::end_time.gt(now))
        .count()
        .get_result(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("user_active_booking_count: {e}")))?;
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

/// All bookings for a user, newest start first.
pub fn bookings_for_user(
    conn: &mut SqliteConnection,
    user_name: &str,
) -> Result<Vec<Booking>, PersistenceError> {
    bookings::table
        .filter(bookings::user_name.eq(user_name))
        .order(bookings::start_time.desc())
        .load::<BookingRow>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("bookings_for_user: {e}")))?
        .into_iter()
        .map(Booking::try_from)
        .collect()
}

/// All bookings on a resource, earliest start first.
pub fn bookings_for_resource(
    conn: &mut SqliteConnection,
    resource_id: i64,
) -> Result<Vec<Booking>, PersistenceError> {
    bookings::table
        .filter(bookings::resource_id.eq(resource_id))
        .order(bookings::start_time.asc())
        .load::<BookingRow>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("bookings_for_resource: {e}")))?
        .into_iter()
        .map(Booking::try_from)
        .collect()
}

/// Looks up a booking by its check-in token.
///
/// Token validity (expiry, status) is not judged here.
pub fn find_booking_by_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> Result<Option<Booking>, PersistenceError> {
    bookings::table
        .filter(bookings::check_in_token.eq(token))
        .first::<BookingRow>(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("find_booking_by_token: {e}")))?
        .map(Booking::try_from)
        .transpose()
}

/// Bookings on a resource that are candidates for anonymous PIN check-in:
/// approved (or legacy confirmed) and not yet checked in. Window selection
/// happens in the core layer.
pub fn checkin_candidates_for_resource(
    conn: &mut SqliteConnection,
    resource_id: i64,
) -> Result<Vec<Booking>, PersistenceError> {
    let eligible = [
        BookingStatus::Approved.as_str(),
        BookingStatus::Confirmed.as_str(),
    ];
    bookings::table
        .filter(bookings::resource_id.eq(resource_id))
        .filter(bookings::status.eq_any(eligible))
        .filter(bookings::checked_in_at.is_null())
        .order(bookings::start_time.asc())
        .load::<BookingRow>(conn)
        .map_err(|e| {
            PersistenceError::QueryFailed(format!("checkin_candidates_for_resource: {e}"))
        })?
        .into_iter()
        .map(Booking::try_from)
        .collect()
}
