// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Series insertion and check-in token minting.
//!
//! Creating a booking series is two-phase. Phase one inserts every
//! occurrence row inside the caller's transaction, so a failure on any
//! row rolls the whole series back. Phase two runs after commit and
//! mints one token per row, touching only rows whose token is still
//! NULL so a retry after a partial failure completes the remainder
//! without reissuing anything.

use crate::data_models::{NewBookingRow, format_stored_instant};
use crate::diesel_schema::bookings;
use crate::error::PersistenceError;
use diesel::SqliteConnection;
use diesel::prelude::*;
use rand::RngExt;
use rand::distr::Alphanumeric;
use resv_domain::{BookingStatus, TimeSlot, format_instant};
use time::Duration;
use tracing::debug;

/// Token length in characters.
pub const TOKEN_LENGTH: usize = 32;

/// Tokens stay redeemable this long past the booking's end.
pub const TOKEN_VALIDITY_HOURS: i64 = 24;

/// Inserts one row per occurrence, returning the new booking ids in
/// occurrence order. Runs inside the caller's transaction.
pub fn insert_series(
    conn: &mut SqliteConnection,
    resource_id: i64,
    user_name: &str,
    title: &str,
    occurrences: &[TimeSlot],
    recurrence_rule: Option<&str>,
) -> Result<Vec<i64>, PersistenceError> {
    let mut ids = Vec::with_capacity(occurrences.len());
    for slot in occurrences {
        let row = NewBookingRow {
            resource_id,
            user_name: user_name.to_string(),
            title: title.to_string(),
            start_time: format_stored_instant(slot.start())?,
            end_time: format_stored_instant(slot.end())?,
            status: BookingStatus::Pending.as_str().to_string(),
            recurrence_rule: recurrence_rule.map(str::to_string),
        };
        let id: i64 = diesel::insert_into(bookings::table)
            .values(&row)
            .returning(bookings::booking_id)
            .get_result(conn)?;
        ids.push(id);
    }
    debug!(count = ids.len(), resource_id, "inserted booking series");
    Ok(ids)
}

/// Mints a check-in token for every listed booking that does not have
/// one yet. Idempotent: rows that already carry a token are skipped, so
/// this can be re-run after a partial failure.
pub fn mint_check_in_tokens(
    conn: &mut SqliteConnection,
    booking_ids: &[i64],
) -> Result<(), PersistenceError> {
    for &booking_id in booking_ids {
        let end_time: Option<String> = bookings::table
            .filter(bookings::booking_id.eq(booking_id))
            .filter(bookings::check_in_token.is_null())
            .select(bookings::end_time)
            .first::<String>(conn)
            .optional()?;

        let Some(end_time) = end_time else {
            continue;
        };

        let end = crate::data_models::parse_stored_instant(&end_time)?;
        let expires_at = format_instant(end + Duration::hours(TOKEN_VALIDITY_HOURS))
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;
        let token = generate_token();

        diesel::update(
            bookings::table
                .filter(bookings::booking_id.eq(booking_id))
                .filter(bookings::check_in_token.is_null()),
        )
        .set((
            bookings::check_in_token.eq(&token),
            bookings::token_expires_at.eq(&expires_at),
        ))
        .execute(conn)?;
        debug!(booking_id, "minted check-in token");
    }
    Ok(())
}

/// Generates a random alphanumeric token.
fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
