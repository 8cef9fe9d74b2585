// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Core entity types for the booking system.
//!
//! All instants are UTC. Stored timestamps are naive strings interpreted as
//! UTC at the persistence boundary; once inside the domain, everything is an
//! `OffsetDateTime` and may be compared directly.

use crate::error::DomainError;
use crate::status::BookingStatus;
use time::OffsetDateTime;

/// A half-open reserved interval with a validated ordering invariant.
///
/// ## Invariants
///
/// - `end` is strictly after `start`
/// - Two slots overlap only when their interiors intersect; touching
///   boundaries (one ends exactly when the other starts) do not conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl TimeSlot {
    /// Creates a new time slot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTimeRange` if `end` is not strictly
    /// after `start`.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::InvalidTimeRange {
                reason: format!("end {end} must be strictly after start {start}"),
            });
        }
        Ok(Self { start, end })
    }

    /// The slot's start instant.
    #[must_use]
    pub const fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// The slot's end instant.
    #[must_use]
    pub const fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Returns true if the two slots strictly overlap.
    ///
    /// Touching boundaries are not an overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Returns true if `instant` lies within `[start, end)`.
    #[must_use]
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Returns this slot shifted forward by a whole number of days.
    #[must_use]
    pub fn shifted_by_days(self, days: i64) -> Self {
        let delta = time::Duration::days(days);
        Self {
            start: self.start + delta,
            end: self.end + delta,
        }
    }
}

/// A bookable entity (room, desk, equipment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Canonical internal identifier.
    pub id: i64,
    /// Display name (informational, not unique).
    pub name: String,
    /// Seating/usage capacity (informational to the booking engine).
    pub capacity: u32,
    /// Whether the resource is currently under maintenance.
    pub is_under_maintenance: bool,
    /// Maintenance end. `None` while `is_under_maintenance` means the
    /// resource is unbookable for any future occurrence.
    pub maintenance_until: Option<OffsetDateTime>,
    /// Optional cap on the recurrence count accepted for this resource.
    pub max_recurrence_count: Option<u32>,
}

impl Resource {
    /// Returns true if the resource blocks an occurrence starting at `start`.
    ///
    /// An unbounded maintenance window blocks everything; a bounded window
    /// blocks only occurrences starting before `maintenance_until`.
    #[must_use]
    pub fn blocks_start(&self, start: OffsetDateTime) -> bool {
        if !self.is_under_maintenance {
            return false;
        }
        self.maintenance_until.is_none_or(|until| start < until)
    }
}

/// One reserved occurrence.
///
/// The owning user is a denormalized name string rather than a foreign key;
/// this mirrors the source system and is flagged in DESIGN.md as an
/// audit-permanence trade-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    /// Canonical internal identifier.
    pub id: i64,
    /// The resource this booking reserves.
    pub resource_id: i64,
    /// The owning user's name.
    pub user_name: String,
    /// Booking title (informational).
    pub title: String,
    /// The reserved interval.
    pub slot: TimeSlot,
    /// Current lifecycle status.
    pub status: BookingStatus,
    /// The recurrence rule this booking was generated from, if any.
    /// Shared across a series but not itself a grouping key.
    pub recurrence_rule: Option<String>,
    /// Free-text reason recorded on admin cancellation.
    pub admin_message: Option<String>,
    /// When the user checked in, if they have.
    pub checked_in_at: Option<OffsetDateTime>,
    /// When the user checked out, if they have.
    pub checked_out_at: Option<OffsetDateTime>,
    /// Single-use QR check-in token. Cleared on use or on expiry detection.
    pub check_in_token: Option<String>,
    /// When the check-in token expires.
    pub token_expires_at: Option<OffsetDateTime>,
}

impl Booking {
    /// Returns true if this booking counts toward conflict and quota checks.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// A user's place in line for a currently unavailable resource.
///
/// Entries are consumed oldest-first when a booking on the resource is
/// cancelled or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistEntry {
    /// Canonical internal identifier.
    pub id: i64,
    /// The resource the user is waiting for.
    pub resource_id: i64,
    /// The waiting user's name.
    pub user_name: String,
    /// When the user enrolled.
    pub created_at: OffsetDateTime,
}

/// A (resource, PIN) pair used for PIN-based check-in.
///
/// The booking engine only ever reads these; PIN lifecycle is managed by
/// external admin collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePin {
    /// The resource this PIN belongs to.
    pub resource_id: i64,
    /// The PIN value, compared by equality.
    pub pin: String,
    /// Whether this PIN is currently accepted.
    pub is_active: bool,
}

/// Singleton booking policy configuration.
///
/// Read-only to the booking engine. An absent settings row means "use the
/// defaults below", never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSettings {
    /// Whether bookings may start in the past at all.
    pub allow_past_bookings: bool,
    /// Signed offset (hours) applied to "now" when past bookings are
    /// allowed. Negative values push the cutoff into the future, requiring
    /// bookings to start at least that far ahead.
    pub past_booking_time_adjustment_hours: i32,
    /// Maximum days into the future a booking may start. `None` = no limit.
    pub max_booking_days_in_future: Option<u32>,
    /// Whether one user may hold overlapping bookings on different resources.
    pub allow_multiple_resources_same_time: bool,
    /// Maximum concurrent active bookings per user. `None` = no limit.
    pub max_bookings_per_user: Option<u32>,
    /// Whether check-in/check-out is enabled at all.
    pub enable_check_in_out: bool,
    /// Minutes before the booking start at which check-in opens.
    pub check_in_minutes_before: u32,
    /// Minutes after the booking start at which check-in closes.
    pub check_in_minutes_after: u32,
    /// Whether the PIN-URL check-in path requires an authenticated user.
    pub resource_checkin_url_requires_login: bool,
    /// Maximum waitlist entries per resource.
    pub waitlist_cap: u32,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            allow_past_bookings: false,
            past_booking_time_adjustment_hours: 0,
            max_booking_days_in_future: None,
            allow_multiple_resources_same_time: true,
            max_bookings_per_user: None,
            enable_check_in_out: false,
            check_in_minutes_before: 15,
            check_in_minutes_after: 15,
            resource_checkin_url_requires_login: false,
            waitlist_cap: 10,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_slot_rejects_reversed_range() {
        let result = TimeSlot::new(
            datetime!(2024-01-01 11:00 UTC),
            datetime!(2024-01-01 10:00 UTC),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_slot_rejects_zero_length() {
        let result = TimeSlot::new(
            datetime!(2024-01-01 10:00 UTC),
            datetime!(2024-01-01 10:00 UTC),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_touching_slots_do_not_overlap() {
        let first = TimeSlot::new(
            datetime!(2024-01-01 10:00 UTC),
            datetime!(2024-01-01 11:00 UTC),
        )
        .unwrap();
        let second = TimeSlot::new(
            datetime!(2024-01-01 11:00 UTC),
            datetime!(2024-01-01 12:00 UTC),
        )
        .unwrap();
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn test_partial_overlap_detected() {
        let first = TimeSlot::new(
            datetime!(2024-01-01 10:00 UTC),
            datetime!(2024-01-01 11:00 UTC),
        )
        .unwrap();
        let second = TimeSlot::new(
            datetime!(2024-01-01 10:30 UTC),
            datetime!(2024-01-01 11:30 UTC),
        )
        .unwrap();
        assert!(first.overlaps(&second));
        assert!(second.overlaps(&first));
    }

    #[test]
    fn test_containment_is_overlap() {
        let outer = TimeSlot::new(
            datetime!(2024-01-01 09:00 UTC),
            datetime!(2024-01-01 12:00 UTC),
        )
        .unwrap();
        let inner = TimeSlot::new(
            datetime!(2024-01-01 10:00 UTC),
            datetime!(2024-01-01 11:00 UTC),
        )
        .unwrap();
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_indefinite_maintenance_blocks_everything() {
        let resource = Resource {
            id: 1,
            name: String::from("Room A"),
            capacity: 4,
            is_under_maintenance: true,
            maintenance_until: None,
            max_recurrence_count: None,
        };
        assert!(resource.blocks_start(datetime!(2099-01-01 00:00 UTC)));
    }

    #[test]
    fn test_bounded_maintenance_blocks_only_before_end() {
        let resource = Resource {
            id: 1,
            name: String::from("Room A"),
            capacity: 4,
            is_under_maintenance: true,
            maintenance_until: Some(datetime!(2024-02-01 00:00 UTC)),
            max_recurrence_count: None,
        };
        assert!(resource.blocks_start(datetime!(2024-01-15 10:00 UTC)));
        assert!(!resource.blocks_start(datetime!(2024-02-01 00:00 UTC)));
        assert!(!resource.blocks_start(datetime!(2024-03-01 10:00 UTC)));
    }
}
