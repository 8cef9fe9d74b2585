// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Waitlist queries.
//!
//! Position is determined by `created_at` then `entry_id`, so two entries
//! sharing a timestamp still have a stable FIFO order.

use crate::data_models::WaitlistRow;
use crate::diesel_schema::waitlist_entries;
use crate::error::PersistenceError;
use diesel::SqliteConnection;
use diesel::prelude::*;
use resv_domain::WaitlistEntry;

/// Number of entries queued on a resource.
pub fn waitlist_len(
    conn: &mut SqliteConnection,
    resource_id: i64,
) -> Result<u32, PersistenceError> {
    let count: i64 = waitlist_entries::table
        .filter(waitlist_entries::resource_id.eq(resource_id))
        .count()
        .get_result(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("waitlist_len: {e}")))?;
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

/// Whether a user already holds a waitlist entry for the resource.
pub fn is_on_waitlist(
    conn: &mut SqliteConnection,
    resource_id: i64,
    user_name: &str,
) -> Result<bool, PersistenceError> {
    let count: i64 = waitlist_entries::table
        .filter(waitlist_entries::resource_id.eq(resource_id))
        .filter(waitlist_entries::user_name.eq(user_name))
        .count()
        .get_result(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("is_on_waitlist: {e}")))?;
    Ok(count > 0)
}

/// The waitlist for a resource in FIFO order.
pub fn waitlist_for_resource(
    conn: &mut SqliteConnection,
    resource_id: i64,
) -> Result<Vec<WaitlistEntry>, PersistenceError> {
    waitlist_entries::table
        .filter(waitlist_entries::resource_id.eq(resource_id))
        .order((
            waitlist_entries::created_at.asc(),
            waitlist_entries::entry_id.asc(),
        ))
        .load::<WaitlistRow>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("waitlist_for_resource: {e}")))?
        .into_iter()
        .map(WaitlistEntry::try_from)
        .collect()
}

/// The oldest entry on a resource's waitlist, if any.
pub fn oldest_entry(
    conn: &mut SqliteConnection,
    resource_id: i64,
) -> Result<Option<WaitlistEntry>, PersistenceError> {
    waitlist_entries::table
        .filter(waitlist_entries::resource_id.eq(resource_id))
        .order((
            waitlist_entries::created_at.asc(),
            waitlist_entries::entry_id.asc(),
        ))
        .first::<WaitlistRow>(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("oldest_entry: {e}")))?
        .map(WaitlistEntry::try_from)
        .transpose()
}
