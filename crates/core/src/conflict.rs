// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Conflict detection for booking requests.
//!
//! For each occurrence in expansion order, the detector checks active
//! bookings on the same resource for strict interval overlap, and, when the
//! single-resource-at-a-time policy is on, the same user's active bookings
//! on other resources.
//!
//! ## Invariants
//!
//! - Touching boundaries never conflict; only interior intersection does
//! - A single conflicting occurrence rejects the whole series
//! - A rejection for a same-resource conflict also carries the waitlist
//!   enrollment decision, computed under the same snapshot as the check

use crate::schedule::ResourceSchedule;
use resv_domain::{Booking, TimeSlot};
use time::OffsetDateTime;

/// A slot conflict with an existing booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// An active booking on the same resource overlaps the occurrence.
    SlotConflict {
        /// The conflicting booking's identifier.
        booking_id: i64,
        /// The conflicting booking's owner.
        user_name: String,
        /// The conflicting booking's start.
        start: OffsetDateTime,
        /// The conflicting booking's end.
        end: OffsetDateTime,
    },
    /// One of the requester's own active bookings on a different resource
    /// overlaps the occurrence.
    UserOverlap {
        /// The user's conflicting booking.
        booking_id: i64,
        /// The other resource it is on.
        resource_id: i64,
        /// The conflicting booking's start.
        start: OffsetDateTime,
        /// The conflicting booking's end.
        end: OffsetDateTime,
    },
}

impl std::fmt::Display for ConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SlotConflict {
                booking_id,
                user_name,
                start,
                end,
            } => {
                write!(
                    f,
                    "Slot conflicts with booking {booking_id} by '{user_name}' ({start} to {end})"
                )
            }
            Self::UserOverlap {
                booking_id,
                resource_id,
                start,
                end,
            } => {
                write!(
                    f,
                    "You already have booking {booking_id} on resource {resource_id} ({start} to {end})"
                )
            }
        }
    }
}

impl std::error::Error for ConflictError {}

/// The waitlist enrollment decision computed alongside a same-resource
/// conflict.
///
/// Enrollment never retries the conflicting request; the request still
/// fails either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitlistDecision {
    /// Enroll the requester; capacity allows and they are not yet listed.
    Enroll,
    /// The resource's waitlist is full.
    AtCapacity,
    /// The requester already has an entry for this resource.
    AlreadyEnrolled,
}

/// Finds the first active booking whose interval strictly overlaps `occ`.
#[must_use]
pub fn find_overlapping<'a>(occ: &TimeSlot, bookings: &'a [Booking]) -> Option<&'a Booking> {
    bookings
        .iter()
        .find(|b| b.is_active() && b.slot.overlaps(occ))
}

/// Checks every occurrence of a series against the schedule snapshot.
///
/// Occurrences are validated in expansion order. The first conflict rejects
/// the whole series; no partial series is ever accepted.
///
/// # Errors
///
/// Returns the conflict, paired with the waitlist decision when it is a
/// same-resource conflict (cross-resource overlaps never enroll anyone).
pub fn detect_conflicts(
    occurrences: &[TimeSlot],
    schedule: &ResourceSchedule,
) -> Result<(), (ConflictError, Option<WaitlistDecision>)> {
    for occ in occurrences {
        if let Some(existing) = find_overlapping(occ, &schedule.resource_bookings) {
            let error = ConflictError::SlotConflict {
                booking_id: existing.id,
                user_name: existing.user_name.clone(),
                start: existing.slot.start(),
                end: existing.slot.end(),
            };
            return Err((error, Some(waitlist_decision(schedule))));
        }

        if !schedule.settings.allow_multiple_resources_same_time
            && let Some(own) = find_overlapping(occ, &schedule.user_other_bookings)
        {
            let error = ConflictError::UserOverlap {
                booking_id: own.id,
                resource_id: own.resource_id,
                start: own.slot.start(),
                end: own.slot.end(),
            };
            return Err((error, None));
        }
    }
    Ok(())
}

fn waitlist_decision(schedule: &ResourceSchedule) -> WaitlistDecision {
    if schedule.user_on_waitlist {
        WaitlistDecision::AlreadyEnrolled
    } else if schedule.waitlist_len < schedule.waitlist_cap {
        WaitlistDecision::Enroll
    } else {
        WaitlistDecision::AtCapacity
    }
}
