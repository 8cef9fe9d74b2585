// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Setup writes: resources, PINs, and the settings singleton.

use crate::data_models::{NewPinRow, NewResourceRow, SettingsRow, format_stored_instant};
use crate::diesel_schema::{booking_settings, resource_pins, resources};
use crate::error::PersistenceError;
use diesel::SqliteConnection;
use diesel::prelude::*;
use resv_domain::{BookingSettings, Resource};

/// Inserts a resource, returning its new id.
pub fn insert_resource(
    conn: &mut SqliteConnection,
    resource: &Resource,
) -> Result<i64, PersistenceError> {
    let row = NewResourceRow {
        name: resource.name.clone(),
        capacity: i32::try_from(resource.capacity).unwrap_or(i32::MAX),
        is_under_maintenance: i32::from(resource.is_under_maintenance),
        maintenance_until: resource
            .maintenance_until
            .map(format_stored_instant)
            .transpose()?,
        max_recurrence_count: resource
            .max_recurrence_count
            .map(|n| i32::try_from(n).unwrap_or(i32::MAX)),
    };
    let id: i64 = diesel::insert_into(resources::table)
        .values(&row)
        .returning(resources::resource_id)
        .get_result(conn)?;
    Ok(id)
}

/// Marks a resource as under (or out of) maintenance.
pub fn set_maintenance(
    conn: &mut SqliteConnection,
    resource_id: i64,
    under_maintenance: bool,
    until: Option<&str>,
) -> Result<(), PersistenceError> {
    diesel::update(resources::table.filter(resources::resource_id.eq(resource_id)))
        .set((
            resources::is_under_maintenance.eq(i32::from(under_maintenance)),
            resources::maintenance_until.eq(until),
        ))
        .execute(conn)?;
    Ok(())
}

/// Writes the settings singleton, replacing any previous values.
pub fn save_settings(
    conn: &mut SqliteConnection,
    settings: &BookingSettings,
) -> Result<(), PersistenceError> {
    let row = SettingsRow::from_settings(settings);
    diesel::replace_into(booking_settings::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

/// Registers a PIN for a resource.
pub fn insert_pin(
    conn: &mut SqliteConnection,
    resource_id: i64,
    pin: &str,
    is_active: bool,
) -> Result<(), PersistenceError> {
    let row = NewPinRow {
        resource_id,
        pin: pin.to_string(),
        is_active: i32::from(is_active),
    };
    diesel::insert_into(resource_pins::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}
