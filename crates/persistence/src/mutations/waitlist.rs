// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Waitlist mutation operations.

use crate::data_models::NewWaitlistRow;
use crate::diesel_schema::waitlist_entries;
use crate::error::PersistenceError;
use crate::queries;
use diesel::SqliteConnection;
use diesel::prelude::*;
use resv_domain::WaitlistEntry;

/// Appends a user to a resource's waitlist.
pub fn enroll(
    conn: &mut SqliteConnection,
    resource_id: i64,
    user_name: &str,
    created_at: &str,
) -> Result<(), PersistenceError> {
    let row = NewWaitlistRow {
        resource_id,
        user_name: user_name.to_string(),
        created_at: created_at.to_string(),
    };
    diesel::insert_into(waitlist_entries::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

/// Removes and returns the oldest entry on a resource's waitlist.
pub fn pop_oldest(
    conn: &mut SqliteConnection,
    resource_id: i64,
) -> Result<Option<WaitlistEntry>, PersistenceError> {
    let Some(entry) = queries::waitlist::oldest_entry(conn, resource_id)? else {
        return Ok(None);
    };
    diesel::delete(waitlist_entries::table.filter(waitlist_entries::entry_id.eq(entry.id)))
        .execute(conn)?;
    Ok(Some(entry))
}
