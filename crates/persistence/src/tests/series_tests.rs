// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Series creation: atomicity, waitlist side effects, token minting.

use super::{instant, request_for, seed_resource, slot, test_store};
use crate::error::PersistenceError;
use crate::mutations::series::{TOKEN_LENGTH, TOKEN_VALIDITY_HOURS};
use resv::{CoreError, ConflictError, WaitlistDecision};
use resv_domain::{BookingSettings, BookingStatus, DomainError, RecurrenceRule};
use time::Duration;

#[test]
fn create_series_persists_pending_booking_with_token() {
    let mut store = test_store();
    let resource_id = seed_resource(&mut store);
    let now = instant("2026-03-01 09:00:00");

    let request = request_for(
        resource_id,
        "alice",
        slot("2026-03-02 10:00:00", "2026-03-02 11:00:00"),
    );
    let created = store.create_series(&request, now).unwrap();

    assert_eq!(created.len(), 1);
    let booking = &created[0];
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(
        booking.check_in_token.as_ref().map(String::len),
        Some(TOKEN_LENGTH)
    );
    assert_eq!(
        booking.token_expires_at,
        Some(booking.slot.end() + Duration::hours(TOKEN_VALIDITY_HOURS))
    );
}

#[test]
fn conflicting_request_is_rejected_and_enrolled_on_waitlist() {
    let mut store = test_store();
    let resource_id = seed_resource(&mut store);
    let now = instant("2026-03-01 09:00:00");

    let first = request_for(
        resource_id,
        "alice",
        slot("2026-03-02 10:00:00", "2026-03-02 11:00:00"),
    );
    store.create_series(&first, now).unwrap();

    let second = request_for(
        resource_id,
        "bob",
        slot("2026-03-02 10:30:00", "2026-03-02 11:30:00"),
    );
    let err = store.create_series(&second, now).unwrap_err();

    let PersistenceError::Rejected(rejection) = err else {
        panic!("expected rejection, got {err}");
    };
    assert!(matches!(
        rejection.error,
        CoreError::Conflict(ConflictError::SlotConflict { .. })
    ));
    assert_eq!(rejection.waitlist, Some(WaitlistDecision::Enroll));

    // The request failed but the enrollment was committed.
    let waitlist = store.waitlist(resource_id).unwrap();
    assert_eq!(waitlist.len(), 1);
    assert_eq!(waitlist[0].user_name, "bob");
    assert!(store.bookings_for_user("bob").unwrap().is_empty());
}

#[test]
fn rejected_user_is_not_enrolled_twice() {
    let mut store = test_store();
    let resource_id = seed_resource(&mut store);
    let now = instant("2026-03-01 09:00:00");

    let first = request_for(
        resource_id,
        "alice",
        slot("2026-03-02 10:00:00", "2026-03-02 11:00:00"),
    );
    store.create_series(&first, now).unwrap();

    let conflicting = request_for(
        resource_id,
        "bob",
        slot("2026-03-02 10:00:00", "2026-03-02 11:00:00"),
    );
    for _ in 0..2 {
        store.create_series(&conflicting, now).unwrap_err();
    }

    assert_eq!(store.waitlist(resource_id).unwrap().len(), 1);
}

#[test]
fn touching_bookings_do_not_conflict() {
    let mut store = test_store();
    let resource_id = seed_resource(&mut store);
    let now = instant("2026-03-01 09:00:00");

    let first = request_for(
        resource_id,
        "alice",
        slot("2026-03-02 10:00:00", "2026-03-02 11:00:00"),
    );
    store.create_series(&first, now).unwrap();

    let adjacent = request_for(
        resource_id,
        "bob",
        slot("2026-03-02 11:00:00", "2026-03-02 12:00:00"),
    );
    store.create_series(&adjacent, now).unwrap();

    assert_eq!(store.bookings_for_resource(resource_id).unwrap().len(), 2);
}

#[test]
fn series_insert_is_all_or_nothing() {
    let mut store = test_store();
    let resource_id = seed_resource(&mut store);
    let now = instant("2026-03-01 09:00:00");

    // Occupy the slot that occurrence 3 of the weekly series will land on.
    let blocker = request_for(
        resource_id,
        "alice",
        slot("2026-03-16 10:00:00", "2026-03-16 11:00:00"),
    );
    store.create_series(&blocker, now).unwrap();

    let mut series = request_for(
        resource_id,
        "bob",
        slot("2026-03-02 10:00:00", "2026-03-02 11:00:00"),
    );
    series.recurrence = Some(RecurrenceRule::parse("FREQ=WEEKLY;COUNT=5").unwrap());

    store.create_series(&series, now).unwrap_err();
    assert!(store.bookings_for_user("bob").unwrap().is_empty());
}

#[test]
fn recurring_series_stores_every_occurrence_with_rule() {
    let mut store = test_store();
    let resource_id = seed_resource(&mut store);
    let now = instant("2026-03-01 09:00:00");

    let mut series = request_for(
        resource_id,
        "alice",
        slot("2026-03-02 10:00:00", "2026-03-02 11:00:00"),
    );
    series.recurrence = Some(RecurrenceRule::parse("FREQ=DAILY;COUNT=3").unwrap());

    let created = store.create_series(&series, now).unwrap();
    assert_eq!(created.len(), 3);
    for (i, booking) in created.iter().enumerate() {
        let expected_start = instant("2026-03-02 10:00:00") + Duration::days(i64::try_from(i).unwrap());
        assert_eq!(booking.slot.start(), expected_start);
        assert_eq!(booking.recurrence_rule.as_deref(), Some("FREQ=DAILY;COUNT=3"));
    }
}

#[test]
fn token_minting_is_idempotent() {
    let mut store = test_store();
    let resource_id = seed_resource(&mut store);
    let now = instant("2026-03-01 09:00:00");

    let request = request_for(
        resource_id,
        "alice",
        slot("2026-03-02 10:00:00", "2026-03-02 11:00:00"),
    );
    let created = store.create_series(&request, now).unwrap();
    let booking_id = created[0].id;
    let original = created[0].check_in_token.clone().unwrap();

    store.mint_missing_tokens(&[booking_id]).unwrap();

    let reloaded = store.get_booking(booking_id).unwrap();
    assert_eq!(reloaded.check_in_token.as_deref(), Some(original.as_str()));
}

#[test]
fn past_booking_is_rejected_under_default_settings() {
    let mut store = test_store();
    let resource_id = seed_resource(&mut store);
    let now = instant("2026-03-02 09:00:00");

    let request = request_for(
        resource_id,
        "alice",
        slot("2026-03-02 08:00:00", "2026-03-02 08:30:00"),
    );
    let err = store.create_series(&request, now).unwrap_err();
    assert!(matches!(err, PersistenceError::Rejected(_)));
    assert!(store.bookings_for_user("alice").unwrap().is_empty());
}

#[test]
fn elapsed_bookings_do_not_count_toward_quota() {
    let mut store = test_store();
    let resource_id = seed_resource(&mut store);
    store
        .save_settings(&BookingSettings {
            max_bookings_per_user: Some(1),
            ..BookingSettings::default()
        })
        .unwrap();

    let early = request_for(
        resource_id,
        "alice",
        slot("2026-01-02 10:00:00", "2026-01-02 11:00:00"),
    );
    store
        .create_series(&early, instant("2026-01-01 09:00:00"))
        .unwrap();

    // A month later that booking has fully elapsed and frees the quota.
    let fresh = request_for(
        resource_id,
        "alice",
        slot("2026-02-02 10:00:00", "2026-02-02 11:00:00"),
    );
    store
        .create_series(&fresh, instant("2026-02-01 09:00:00"))
        .unwrap();

    // The still-upcoming booking occupies it again.
    let third = request_for(
        resource_id,
        "alice",
        slot("2026-02-03 10:00:00", "2026-02-03 11:00:00"),
    );
    let err = store
        .create_series(&third, instant("2026-02-01 10:00:00"))
        .unwrap_err();
    let PersistenceError::Rejected(rejection) = err else {
        panic!("expected rejection, got {err}");
    };
    assert!(matches!(
        rejection.error,
        CoreError::DomainViolation(DomainError::QuotaExceeded { .. })
    ));
}

#[test]
fn waitlist_cap_is_taken_from_settings() {
    let mut store = test_store();
    let resource_id = seed_resource(&mut store);
    let now = instant("2026-03-01 09:00:00");
    store
        .save_settings(&BookingSettings {
            waitlist_cap: 1,
            ..BookingSettings::default()
        })
        .unwrap();

    let holder = request_for(
        resource_id,
        "alice",
        slot("2026-03-02 10:00:00", "2026-03-02 11:00:00"),
    );
    store.create_series(&holder, now).unwrap();

    let contested = slot("2026-03-02 10:30:00", "2026-03-02 11:30:00");
    let err = store
        .create_series(&request_for(resource_id, "bob", contested), now)
        .unwrap_err();
    let PersistenceError::Rejected(rejection) = err else {
        panic!("expected rejection, got {err}");
    };
    assert_eq!(rejection.waitlist, Some(WaitlistDecision::Enroll));

    // Bob filled the single configured slot; carol is turned away.
    let err = store
        .create_series(&request_for(resource_id, "carol", contested), now)
        .unwrap_err();
    let PersistenceError::Rejected(rejection) = err else {
        panic!("expected rejection, got {err}");
    };
    assert_eq!(rejection.waitlist, Some(WaitlistDecision::AtCapacity));
    assert_eq!(store.waitlist(resource_id).unwrap().len(), 1);
}
