// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event mutation operations.

use crate::data_models::NewAuditEventRow;
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;
use diesel::SqliteConnection;
use diesel::prelude::*;
use resv_audit::AuditEvent;
use time::OffsetDateTime;

/// Appends an audit event.
pub fn insert_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
    created_at: OffsetDateTime,
) -> Result<(), PersistenceError> {
    let row = NewAuditEventRow::from_event(event, created_at)?;
    diesel::insert_into(audit_events::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}
