// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{booking, empty_schedule, slot};
use crate::conflict::ConflictError;
use crate::error::CoreError;
use crate::evaluate::evaluate_booking_request;
use crate::request::BookingRequest;
use resv_domain::{DomainError, RecurrenceRule};
use time::macros::datetime;

fn request(recurrence: Option<&str>) -> BookingRequest {
    BookingRequest {
        resource_id: 1,
        user_name: String::from("alice"),
        title: String::from("Standup"),
        base_slot: slot(
            datetime!(2024-01-01 10:00 UTC),
            datetime!(2024-01-01 11:00 UTC),
        ),
        recurrence: recurrence.map(|r| RecurrenceRule::parse(r).unwrap()),
    }
}

const NOW: time::OffsetDateTime = datetime!(2024-01-01 09:00 UTC);

#[test]
fn test_single_occurrence_accepted_on_empty_schedule() {
    let schedule = empty_schedule();
    let series = evaluate_booking_request(&request(None), &schedule, NOW).unwrap();

    assert_eq!(series.occurrences.len(), 1);
    assert_eq!(series.recurrence_rule, None);
}

#[test]
fn test_weekly_series_expanded_and_accepted() {
    let schedule = empty_schedule();
    let series =
        evaluate_booking_request(&request(Some("FREQ=WEEKLY;COUNT=4")), &schedule, NOW).unwrap();

    assert_eq!(series.occurrences.len(), 4);
    assert_eq!(
        series.recurrence_rule.as_deref(),
        Some("FREQ=WEEKLY;COUNT=4")
    );
    assert_eq!(
        series.occurrences[3].start(),
        datetime!(2024-01-22 10:00 UTC)
    );
}

#[test]
fn test_recurrence_cap_checked_before_expansion() {
    let mut schedule = empty_schedule();
    schedule.resource.max_recurrence_count = Some(3);

    let rejection =
        evaluate_booking_request(&request(Some("FREQ=DAILY;COUNT=5")), &schedule, NOW).unwrap_err();

    assert!(matches!(
        rejection.error,
        CoreError::DomainViolation(DomainError::RecurrenceLimitExceeded {
            requested: 5,
            max: 3
        })
    ));
}

#[test]
fn test_policy_violation_fails_fast_before_conflicts() {
    let mut schedule = empty_schedule();
    schedule.resource.is_under_maintenance = true;
    // Also plant a conflicting booking; the maintenance policy must win.
    schedule.resource_bookings.push(booking(
        10,
        1,
        "bob",
        slot(
            datetime!(2024-01-01 10:00 UTC),
            datetime!(2024-01-01 11:00 UTC),
        ),
    ));

    let rejection = evaluate_booking_request(&request(None), &schedule, NOW).unwrap_err();

    assert!(matches!(
        rejection.error,
        CoreError::DomainViolation(DomainError::ResourceUnderMaintenance { .. })
    ));
    assert_eq!(rejection.waitlist, None);
}

#[test]
fn test_quota_counts_requested_series() {
    let mut schedule = empty_schedule();
    schedule.settings.max_bookings_per_user = Some(4);
    schedule.user_active_count = 2;

    let rejection =
        evaluate_booking_request(&request(Some("FREQ=DAILY;COUNT=3")), &schedule, NOW).unwrap_err();

    assert!(matches!(
        rejection.error,
        CoreError::DomainViolation(DomainError::QuotaExceeded {
            existing: 2,
            requested: 3,
            max: 4
        })
    ));
}

#[test]
fn test_conflict_on_any_occurrence_rejects_whole_series() {
    let mut schedule = empty_schedule();
    // Occurrence 3 of a weekly series lands on 2024-01-15.
    schedule.resource_bookings.push(booking(
        10,
        1,
        "bob",
        slot(
            datetime!(2024-01-15 10:30 UTC),
            datetime!(2024-01-15 11:30 UTC),
        ),
    ));

    let rejection =
        evaluate_booking_request(&request(Some("FREQ=WEEKLY;COUNT=5")), &schedule, NOW).unwrap_err();

    assert!(matches!(
        rejection.error,
        CoreError::Conflict(ConflictError::SlotConflict { booking_id: 10, .. })
    ));
    assert!(rejection.waitlist.is_some());
}

#[test]
fn test_concurrent_resource_policy_rejects_first_occurrence_overlap() {
    let mut schedule = empty_schedule();
    schedule.settings.allow_multiple_resources_same_time = false;
    schedule.user_other_bookings.push(booking(
        30,
        3,
        "alice",
        slot(
            datetime!(2024-01-01 09:30 UTC),
            datetime!(2024-01-01 10:30 UTC),
        ),
    ));

    let rejection = evaluate_booking_request(&request(None), &schedule, NOW).unwrap_err();

    assert!(matches!(
        rejection.error,
        CoreError::DomainViolation(DomainError::ConcurrentResourceConflict {
            booking_id: 30,
            resource_id: 3
        })
    ));
}

#[test]
fn test_unrecognized_frequency_books_single_occurrence() {
    // The degraded rule must still carry its raw string onto the booking.
    let schedule = empty_schedule();
    let series =
        evaluate_booking_request(&request(Some("FREQ=MONTHLY;COUNT=6")), &schedule, NOW).unwrap();

    assert_eq!(series.occurrences.len(), 1);
    assert_eq!(
        series.recurrence_rule.as_deref(),
        Some("FREQ=MONTHLY;COUNT=6")
    );
}
