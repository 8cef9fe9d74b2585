// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Single-booking mutation operations.
//!
//! Status strings written here always come from `BookingStatus::as_str`,
//! never from caller input.

use crate::diesel_schema::bookings;
use crate::error::PersistenceError;
use diesel::SqliteConnection;
use diesel::prelude::*;
use resv_domain::BookingStatus;

/// Rewrites a booking's time window and title.
pub fn update_booking_window(
    conn: &mut SqliteConnection,
    booking_id: i64,
    start_time: &str,
    end_time: &str,
    title: &str,
) -> Result<(), PersistenceError> {
    diesel::update(bookings::table.filter(bookings::booking_id.eq(booking_id)))
        .set((
            bookings::start_time.eq(start_time),
            bookings::end_time.eq(end_time),
            bookings::title.eq(title),
        ))
        .execute(conn)?;
    Ok(())
}

/// Sets a booking's status.
pub fn update_status(
    conn: &mut SqliteConnection,
    booking_id: i64,
    status: BookingStatus,
) -> Result<(), PersistenceError> {
    diesel::update(bookings::table.filter(bookings::booking_id.eq(booking_id)))
        .set(bookings::status.eq(status.as_str()))
        .execute(conn)?;
    Ok(())
}

/// Sets or clears the admin message attached to a booking.
pub fn set_admin_message(
    conn: &mut SqliteConnection,
    booking_id: i64,
    message: Option<&str>,
) -> Result<(), PersistenceError> {
    diesel::update(bookings::table.filter(bookings::booking_id.eq(booking_id)))
        .set(bookings::admin_message.eq(message))
        .execute(conn)?;
    Ok(())
}

/// Records a check-in: transitions to `checked_in` and stamps the time.
pub fn record_check_in(
    conn: &mut SqliteConnection,
    booking_id: i64,
    checked_in_at: &str,
) -> Result<(), PersistenceError> {
    diesel::update(bookings::table.filter(bookings::booking_id.eq(booking_id)))
        .set((
            bookings::status.eq(BookingStatus::CheckedIn.as_str()),
            bookings::checked_in_at.eq(checked_in_at),
        ))
        .execute(conn)?;
    Ok(())
}

/// Records a check-out: transitions to `completed` and stamps the time.
pub fn record_check_out(
    conn: &mut SqliteConnection,
    booking_id: i64,
    checked_out_at: &str,
) -> Result<(), PersistenceError> {
    diesel::update(bookings::table.filter(bookings::booking_id.eq(booking_id)))
        .set((
            bookings::status.eq(BookingStatus::Completed.as_str()),
            bookings::checked_out_at.eq(checked_out_at),
        ))
        .execute(conn)?;
    Ok(())
}

/// Invalidates a booking's check-in token. Safe to call on a booking
/// that no longer has one.
pub fn clear_check_in_token(
    conn: &mut SqliteConnection,
    booking_id: i64,
) -> Result<(), PersistenceError> {
    diesel::update(bookings::table.filter(bookings::booking_id.eq(booking_id)))
        .set((
            bookings::check_in_token.eq(None::<String>),
            bookings::token_expires_at.eq(None::<String>),
        ))
        .execute(conn)?;
    Ok(())
}

/// Deletes a booking row.
pub fn delete_booking(
    conn: &mut SqliteConnection,
    booking_id: i64,
) -> Result<(), PersistenceError> {
    let deleted =
        diesel::delete(bookings::table.filter(bookings::booking_id.eq(booking_id))).execute(conn)?;
    if deleted == 0 {
        return Err(PersistenceError::BookingNotFound(booking_id));
    }
    Ok(())
}

/// Cancels every pending booking whose start has passed. Returns the
/// number of bookings cancelled.
pub fn cancel_stale_pending(
    conn: &mut SqliteConnection,
    now: &str,
) -> Result<usize, PersistenceError> {
    let cancelled = diesel::update(
        bookings::table
            .filter(bookings::status.eq(BookingStatus::Pending.as_str()))
            .filter(bookings::start_time.lt(now)),
    )
    .set(bookings::status.eq(BookingStatus::CancelledByAdmin.as_str()))
    .execute(conn)?;
    Ok(cancelled)
}
