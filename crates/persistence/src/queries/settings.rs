// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking settings queries.

use crate::data_models::SettingsRow;
use crate::diesel_schema::booking_settings;
use crate::error::PersistenceError;
use diesel::SqliteConnection;
use diesel::prelude::*;
use resv_domain::BookingSettings;

/// Loads the singleton settings row, falling back to defaults when the
/// row has never been written.
pub fn load_settings(conn: &mut SqliteConnection) -> Result<BookingSettings, PersistenceError> {
    let row = booking_settings::table
        .filter(booking_settings::settings_id.eq(1))
        .first::<SettingsRow>(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("load_settings: {e}")))?;
    Ok(row.map(BookingSettings::from).unwrap_or_default())
}
