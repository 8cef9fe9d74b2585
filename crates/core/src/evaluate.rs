// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking request evaluation.
//!
//! The engine's entry point: policy checks fail fast, then the recurrence
//! rule expands into occurrences, then every occurrence must pass conflict
//! detection. Only a fully clean series is returned for persistence.

use crate::conflict::{ConflictError, WaitlistDecision, detect_conflicts, find_overlapping};
use crate::error::CoreError;
use crate::request::BookingRequest;
use crate::schedule::ResourceSchedule;
use resv_domain::{
    DomainError, PolicyInputs, TimeSlot, check_recurrence_limit, evaluate_policies, expand,
};
use time::OffsetDateTime;

/// A series that passed every policy and conflict check and may be
/// persisted atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSeries {
    /// The occurrences, in chronological order.
    pub occurrences: Vec<TimeSlot>,
    /// The raw recurrence rule string shared by the series, if any.
    pub recurrence_rule: Option<String>,
}

/// A rejected booking request.
///
/// Carries the error plus the waitlist enrollment decision when the
/// rejection was a same-resource slot conflict. Enrollment is a best-effort
/// side effect; the request fails regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Why the request was rejected.
    pub error: CoreError,
    /// Waitlist decision, present only for same-resource slot conflicts.
    pub waitlist: Option<WaitlistDecision>,
}

impl Rejection {
    fn policy(error: DomainError) -> Self {
        Self {
            error: CoreError::DomainViolation(error),
            waitlist: None,
        }
    }

    const fn conflict(error: ConflictError, waitlist: Option<WaitlistDecision>) -> Self {
        Self {
            error: CoreError::Conflict(error),
            waitlist,
        }
    }
}

/// Evaluates a booking request against a schedule snapshot.
///
/// Check order:
///
/// 1. recurrence cap (resource-level, before expansion)
/// 2. expansion into occurrences
/// 3. policy evaluation (past window, horizon, maintenance, quota)
/// 4. single-resource-at-a-time policy against the first occurrence
/// 5. conflict detection per occurrence, in expansion order
///
/// Permission has already been enforced at the API boundary.
///
/// # Errors
///
/// Returns a [`Rejection`] describing the first failed check. Same-resource
/// conflicts include the waitlist enrollment decision.
pub fn evaluate_booking_request(
    request: &BookingRequest,
    schedule: &ResourceSchedule,
    now: OffsetDateTime,
) -> Result<ValidatedSeries, Rejection> {
    if let Some(rule) = &request.recurrence {
        check_recurrence_limit(rule, schedule.resource.max_recurrence_count)
            .map_err(Rejection::policy)?;
    }

    let occurrences = expand(request.recurrence.as_ref(), request.base_slot);

    let inputs = PolicyInputs {
        settings: &schedule.settings,
        resource: &schedule.resource,
        now,
        existing_active_count: schedule.user_active_count,
    };
    evaluate_policies(&inputs, &occurrences).map_err(Rejection::policy)?;

    // Single-resource-at-a-time is evaluated against the first occurrence
    // before the per-occurrence conflict pass, matching the policy order of
    // the settings contract.
    if !schedule.settings.allow_multiple_resources_same_time
        && let Some(first) = occurrences.first()
        && let Some(own) = find_overlapping(first, &schedule.user_other_bookings)
    {
        return Err(Rejection::policy(DomainError::ConcurrentResourceConflict {
            booking_id: own.id,
            resource_id: own.resource_id,
        }));
    }

    detect_conflicts(&occurrences, schedule)
        .map_err(|(error, waitlist)| Rejection::conflict(error, waitlist))?;

    Ok(ValidatedSeries {
        occurrences,
        recurrence_rule: request.recurrence.as_ref().map(|r| r.raw.clone()),
    })
}
