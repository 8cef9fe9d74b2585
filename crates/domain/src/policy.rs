// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking policy evaluation.
//!
//! Policies run once per incoming booking request, in a fixed order,
//! short-circuiting on the first failure:
//!
//! 1. past-booking window (with signed adjustment)
//! 2. future horizon
//! 3. maintenance blackout
//! 4. per-user quota
//!
//! Permission checks and the single-resource-at-a-time policy need external
//! data (the permission collaborator, the user's other bookings) and are
//! enforced by the API boundary and the booking engine respectively.
//!
//! All checks operate on UTC instants; see the `clock` module for the
//! normalization rules.

use crate::error::DomainError;
use crate::types::{BookingSettings, Resource, TimeSlot};
use time::{Duration, OffsetDateTime};

/// Inputs shared by all policy checks for one booking request.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInputs<'a> {
    /// The singleton booking settings (or defaults).
    pub settings: &'a BookingSettings,
    /// The resource being booked.
    pub resource: &'a Resource,
    /// The current instant.
    pub now: OffsetDateTime,
    /// The user's current count of active bookings.
    pub existing_active_count: u32,
}

/// Runs all policy checks in order, short-circuiting on the first failure.
///
/// # Errors
///
/// Returns the first policy violation encountered.
pub fn evaluate_policies(
    inputs: &PolicyInputs<'_>,
    occurrences: &[TimeSlot],
) -> Result<(), DomainError> {
    check_past_window(inputs.settings, inputs.now, occurrences)?;
    check_future_horizon(inputs.settings, inputs.now, occurrences)?;
    check_maintenance(inputs.resource, occurrences)?;
    check_quota(
        inputs.settings.max_bookings_per_user,
        inputs.existing_active_count,
        occurrences.len(),
    )?;
    Ok(())
}

/// Enforces the past-booking window.
///
/// With past bookings disabled, no occurrence may start before now. With
/// them enabled, the cutoff is `now - adjustment_hours`; a negative
/// adjustment pushes the cutoff into the future, requiring bookings to
/// start at least that far ahead.
///
/// # Errors
///
/// Returns `PastBookingNotAllowed` or `OutsideAllowedWindow` for the first
/// occurrence starting too early.
pub fn check_past_window(
    settings: &BookingSettings,
    now: OffsetDateTime,
    occurrences: &[TimeSlot],
) -> Result<(), DomainError> {
    if settings.allow_past_bookings {
        let cutoff = now - Duration::hours(i64::from(settings.past_booking_time_adjustment_hours));
        for occ in occurrences {
            if occ.start() < cutoff {
                return Err(DomainError::OutsideAllowedWindow {
                    start: occ.start(),
                    cutoff,
                });
            }
        }
    } else {
        for occ in occurrences {
            if occ.start() < now {
                return Err(DomainError::PastBookingNotAllowed { start: occ.start() });
            }
        }
    }
    Ok(())
}

/// Enforces the future booking horizon, if one is configured.
///
/// The comparison is by calendar date: an occurrence fails when its date
/// exceeds `today + horizon` days.
///
/// # Errors
///
/// Returns `TooFarInFuture` for the first occurrence beyond the horizon.
pub fn check_future_horizon(
    settings: &BookingSettings,
    now: OffsetDateTime,
    occurrences: &[TimeSlot],
) -> Result<(), DomainError> {
    let Some(horizon_days) = settings.max_booking_days_in_future else {
        return Ok(());
    };
    let latest = now.date() + Duration::days(i64::from(horizon_days));
    for occ in occurrences {
        if occ.start().date() > latest {
            return Err(DomainError::TooFarInFuture {
                date: occ.start().date(),
                latest,
            });
        }
    }
    Ok(())
}

/// Enforces the resource's maintenance blackout.
///
/// # Errors
///
/// Returns `ResourceUnderMaintenance` for the first blocked occurrence.
pub fn check_maintenance(resource: &Resource, occurrences: &[TimeSlot]) -> Result<(), DomainError> {
    for occ in occurrences {
        if resource.blocks_start(occ.start()) {
            return Err(DomainError::ResourceUnderMaintenance {
                resource_id: resource.id,
                until: resource.maintenance_until,
            });
        }
    }
    Ok(())
}

/// Enforces the per-user active booking quota.
///
/// The whole requested series counts at once: the request fails when
/// `existing + requested > max`.
///
/// # Errors
///
/// Returns `QuotaExceeded` if the quota would be exceeded.
pub fn check_quota(
    max_bookings_per_user: Option<u32>,
    existing: u32,
    requested: usize,
) -> Result<(), DomainError> {
    let Some(max) = max_bookings_per_user else {
        return Ok(());
    };
    let requested = u32::try_from(requested).unwrap_or(u32::MAX);
    if existing.saturating_add(requested) > max {
        return Err(DomainError::QuotaExceeded {
            existing,
            requested,
            max,
        });
    }
    Ok(())
}
