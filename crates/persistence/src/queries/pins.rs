// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Resource PIN queries.

use crate::data_models::PinRow;
use crate::diesel_schema::resource_pins;
use crate::error::PersistenceError;
use diesel::SqliteConnection;
use diesel::prelude::*;
use resv_domain::ResourcePin;

/// Active PINs configured for a resource.
pub fn active_pins_for_resource(
    conn: &mut SqliteConnection,
    resource_id: i64,
) -> Result<Vec<ResourcePin>, PersistenceError> {
    resource_pins::table
        .filter(resource_pins::resource_id.eq(resource_id))
        .filter(resource_pins::is_active.eq(1))
        .load::<PinRow>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("active_pins_for_resource: {e}")))
        .map(|rows| rows.into_iter().map(ResourcePin::from).collect())
}
