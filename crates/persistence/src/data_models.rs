// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row structs and their conversions to and from domain types.
//!
//! This is the persistence boundary: stored status strings are validated
//! here (unknown values are rejected, never silently compared) and naive
//! timestamp strings become UTC instants here.

use crate::diesel_schema::{
    audit_events, booking_settings, bookings, resource_pins, resources, waitlist_entries,
};
use crate::error::PersistenceError;
use diesel::prelude::*;
use resv_audit::{AuditEvent, BookingSnapshot};
use resv_domain::{
    Booking, BookingSettings, BookingStatus, Resource, ResourcePin, TimeSlot, WaitlistEntry,
    format_instant, parse_instant,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A stored resource row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = resources)]
pub struct ResourceRow {
    pub resource_id: i64,
    pub name: String,
    pub capacity: i32,
    pub is_under_maintenance: i32,
    pub maintenance_until: Option<String>,
    pub max_recurrence_count: Option<i32>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = PersistenceError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.resource_id,
            name: row.name,
            capacity: u32::try_from(row.capacity).unwrap_or(0),
            is_under_maintenance: row.is_under_maintenance != 0,
            maintenance_until: row
                .maintenance_until
                .as_deref()
                .map(parse_stored_instant)
                .transpose()?,
            max_recurrence_count: row
                .max_recurrence_count
                .map(|n| u32::try_from(n).unwrap_or(0)),
        })
    }
}

/// A new resource row to insert.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = resources)]
pub struct NewResourceRow {
    pub name: String,
    pub capacity: i32,
    pub is_under_maintenance: i32,
    pub maintenance_until: Option<String>,
    pub max_recurrence_count: Option<i32>,
}

/// A stored booking row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
pub struct BookingRow {
    pub booking_id: i64,
    pub resource_id: i64,
    pub user_name: String,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub recurrence_rule: Option<String>,
    pub admin_message: Option<String>,
    pub checked_in_at: Option<String>,
    pub checked_out_at: Option<String>,
    pub check_in_token: Option<String>,
    pub token_expires_at: Option<String>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = PersistenceError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status: BookingStatus =
            row.status
                .parse()
                .map_err(|_| PersistenceError::InvalidStoredStatus {
                    booking_id: row.booking_id,
                    status: row.status.clone(),
                })?;

        let start = parse_stored_instant(&row.start_time)?;
        let end = parse_stored_instant(&row.end_time)?;
        let slot = TimeSlot::new(start, end).map_err(|e| {
            PersistenceError::ReconstructionError(format!(
                "booking {} has an invalid stored interval: {e}",
                row.booking_id
            ))
        })?;

        Ok(Self {
            id: row.booking_id,
            resource_id: row.resource_id,
            user_name: row.user_name,
            title: row.title,
            slot,
            status,
            recurrence_rule: row.recurrence_rule,
            admin_message: row.admin_message,
            checked_in_at: row
                .checked_in_at
                .as_deref()
                .map(parse_stored_instant)
                .transpose()?,
            checked_out_at: row
                .checked_out_at
                .as_deref()
                .map(parse_stored_instant)
                .transpose()?,
            check_in_token: row.check_in_token,
            token_expires_at: row
                .token_expires_at
                .as_deref()
                .map(parse_stored_instant)
                .transpose()?,
        })
    }
}

/// A new booking row to insert (one occurrence of a series).
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBookingRow {
    pub resource_id: i64,
    pub user_name: String,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub recurrence_rule: Option<String>,
}

/// A stored waitlist entry row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = waitlist_entries)]
pub struct WaitlistRow {
    pub entry_id: i64,
    pub resource_id: i64,
    pub user_name: String,
    pub created_at: String,
}

impl TryFrom<WaitlistRow> for WaitlistEntry {
    type Error = PersistenceError;

    fn try_from(row: WaitlistRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.entry_id,
            resource_id: row.resource_id,
            user_name: row.user_name,
            created_at: parse_stored_instant(&row.created_at)?,
        })
    }
}

/// A new waitlist entry to insert.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = waitlist_entries)]
pub struct NewWaitlistRow {
    pub resource_id: i64,
    pub user_name: String,
    pub created_at: String,
}

/// The singleton settings row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = booking_settings)]
pub struct SettingsRow {
    pub settings_id: i64,
    pub allow_past_bookings: i32,
    pub past_booking_time_adjustment_hours: i32,
    pub max_booking_days_in_future: Option<i32>,
    pub allow_multiple_resources_same_time: i32,
    pub max_bookings_per_user: Option<i32>,
    pub enable_check_in_out: i32,
    pub check_in_minutes_before: i32,
    pub check_in_minutes_after: i32,
    pub resource_checkin_url_requires_login: i32,
    pub waitlist_cap: i32,
}

impl From<SettingsRow> for BookingSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            allow_past_bookings: row.allow_past_bookings != 0,
            past_booking_time_adjustment_hours: row.past_booking_time_adjustment_hours,
            max_booking_days_in_future: row
                .max_booking_days_in_future
                .map(|n| u32::try_from(n).unwrap_or(0)),
            allow_multiple_resources_same_time: row.allow_multiple_resources_same_time != 0,
            max_bookings_per_user: row
                .max_bookings_per_user
                .map(|n| u32::try_from(n).unwrap_or(0)),
            enable_check_in_out: row.enable_check_in_out != 0,
            check_in_minutes_before: u32::try_from(row.check_in_minutes_before).unwrap_or(0),
            check_in_minutes_after: u32::try_from(row.check_in_minutes_after).unwrap_or(0),
            resource_checkin_url_requires_login: row.resource_checkin_url_requires_login != 0,
            waitlist_cap: u32::try_from(row.waitlist_cap).unwrap_or(0),
        }
    }
}

impl SettingsRow {
    /// Builds the singleton row from domain settings.
    #[must_use]
    pub fn from_settings(settings: &BookingSettings) -> Self {
        Self {
            settings_id: 1,
            allow_past_bookings: i32::from(settings.allow_past_bookings),
            past_booking_time_adjustment_hours: settings.past_booking_time_adjustment_hours,
            max_booking_days_in_future: settings
                .max_booking_days_in_future
                .map(|n| i32::try_from(n).unwrap_or(i32::MAX)),
            allow_multiple_resources_same_time: i32::from(
                settings.allow_multiple_resources_same_time,
            ),
            max_bookings_per_user: settings
                .max_bookings_per_user
                .map(|n| i32::try_from(n).unwrap_or(i32::MAX)),
            enable_check_in_out: i32::from(settings.enable_check_in_out),
            check_in_minutes_before: i32::try_from(settings.check_in_minutes_before)
                .unwrap_or(i32::MAX),
            check_in_minutes_after: i32::try_from(settings.check_in_minutes_after)
                .unwrap_or(i32::MAX),
            resource_checkin_url_requires_login: i32::from(
                settings.resource_checkin_url_requires_login,
            ),
            waitlist_cap: i32::try_from(settings.waitlist_cap).unwrap_or(i32::MAX),
        }
    }
}

/// A stored resource PIN row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = resource_pins)]
pub struct PinRow {
    pub pin_id: i64,
    pub resource_id: i64,
    pub pin: String,
    pub is_active: i32,
}

impl From<PinRow> for ResourcePin {
    fn from(row: PinRow) -> Self {
        Self {
            resource_id: row.resource_id,
            pin: row.pin,
            is_active: row.is_active != 0,
        }
    }
}

/// A new resource PIN to insert.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = resource_pins)]
pub struct NewPinRow {
    pub resource_id: i64,
    pub pin: String,
    pub is_active: i32,
}

/// Serialized form of a booking snapshot in an audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotData {
    pub booking_id: i64,
    pub resource_id: i64,
    pub user_name: String,
    pub status: String,
    pub slot: String,
}

impl From<&BookingSnapshot> for SnapshotData {
    fn from(snapshot: &BookingSnapshot) -> Self {
        Self {
            booking_id: snapshot.booking_id,
            resource_id: snapshot.resource_id,
            user_name: snapshot.user_name.clone(),
            status: snapshot.status.as_str().to_string(),
            slot: snapshot.slot.clone(),
        }
    }
}

/// A new audit event row to insert.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_events)]
pub struct NewAuditEventRow {
    pub actor_id: String,
    pub actor_type: String,
    pub cause_id: String,
    pub cause_description: String,
    pub action_name: String,
    pub action_details: Option<String>,
    pub before_json: Option<String>,
    pub after_json: Option<String>,
    pub created_at: String,
}

impl NewAuditEventRow {
    /// Serializes an audit event for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if snapshot serialization fails.
    pub fn from_event(
        event: &AuditEvent,
        created_at: OffsetDateTime,
    ) -> Result<Self, PersistenceError> {
        let serialize = |snapshot: &BookingSnapshot| {
            serde_json::to_string(&SnapshotData::from(snapshot))
                .map_err(|e| PersistenceError::SerializationError(e.to_string()))
        };

        Ok(Self {
            actor_id: event.actor.id.clone(),
            actor_type: event.actor.actor_type.clone(),
            cause_id: event.cause.id.clone(),
            cause_description: event.cause.description.clone(),
            action_name: event.action.name.clone(),
            action_details: event.action.details.clone(),
            before_json: event.before.as_ref().map(serialize).transpose()?,
            after_json: event.after.as_ref().map(serialize).transpose()?,
            created_at: format_stored_instant(created_at)?,
        })
    }
}

/// Parses a stored naive-UTC timestamp.
///
/// # Errors
///
/// Returns `PersistenceError::ReconstructionError` for malformed values.
pub fn parse_stored_instant(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    parse_instant(value)
        .map_err(|e| PersistenceError::ReconstructionError(format!("bad stored timestamp: {e}")))
}

/// Formats an instant for storage.
///
/// # Errors
///
/// Returns `PersistenceError::SerializationError` if formatting fails.
pub fn format_stored_instant(instant: OffsetDateTime) -> Result<String, PersistenceError> {
    format_instant(instant).map_err(|e| PersistenceError::SerializationError(e.to_string()))
}
