// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The four check-in paths and check-out, end to end.

use super::{
    RecordingNotifier, admin, booking_request, checkin_settings, clock_at, member, test_cause,
    test_store,
};
use crate::auth::AllowAll;
use crate::error::ApiError;
use crate::handlers;
use resv_domain::BookingSettings;
use resv_persistence::SqlitePersistence;

/// Creates and approves a booking for 10:00-11:00 on the given date.
fn approved_booking(store: &mut SqlitePersistence, resource_id: i64, user: &str, date: &str) -> i64 {
    let mut notifier = RecordingNotifier::default();
    let booking_id = handlers::create_booking(
        store,
        booking_request(resource_id, date, "10:00", "11:00"),
        &member(user),
        &AllowAll,
        &mut notifier,
        &test_cause(),
        &clock_at("2026-03-01 09:00:00"),
    )
    .unwrap()
    .bookings[0]
        .booking_id;
    handlers::approve_booking(
        store,
        booking_id,
        &admin(),
        &mut notifier,
        &test_cause(),
        &clock_at("2026-03-01 10:00:00"),
    )
    .unwrap();
    booking_id
}

#[test]
fn check_in_is_idempotent() {
    let (mut store, resource_id) = test_store();
    store.save_settings(&checkin_settings()).unwrap();
    let booking_id = approved_booking(&mut store, resource_id, "alice", "2026-03-02");

    let clock = clock_at("2026-03-02 09:50:00");
    let first = handlers::check_in(
        &mut store,
        booking_id,
        &member("alice"),
        None,
        &test_cause(),
        &clock,
    )
    .unwrap();
    assert!(!first.already_checked_in);
    assert_eq!(first.checked_in_at, "2026-03-02 09:50:00");

    let second = handlers::check_in(
        &mut store,
        booking_id,
        &member("alice"),
        None,
        &test_cause(),
        &clock_at("2026-03-02 09:55:00"),
    )
    .unwrap();
    assert!(second.already_checked_in);
    assert_eq!(second.checked_in_at, "2026-03-02 09:50:00");
}

#[test]
fn check_in_outside_window_fails() {
    let (mut store, resource_id) = test_store();
    store.save_settings(&checkin_settings()).unwrap();
    let booking_id = approved_booking(&mut store, resource_id, "alice", "2026-03-02");

    let err = handlers::check_in(
        &mut store,
        booking_id,
        &member("alice"),
        None,
        &test_cause(),
        &clock_at("2026-03-02 09:30:00"),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));
}

#[test]
fn check_in_disabled_by_settings() {
    let (mut store, resource_id) = test_store();
    let booking_id = approved_booking(&mut store, resource_id, "alice", "2026-03-02");

    let err = handlers::check_in(
        &mut store,
        booking_id,
        &member("alice"),
        None,
        &test_cause(),
        &clock_at("2026-03-02 09:50:00"),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));
}

#[test]
fn wrong_pin_rejected_matching_pin_accepted() {
    let (mut store, resource_id) = test_store();
    store.save_settings(&checkin_settings()).unwrap();
    store.insert_pin(resource_id, "4242", true).unwrap();
    store.insert_pin(resource_id, "9999", false).unwrap();
    let booking_id = approved_booking(&mut store, resource_id, "alice", "2026-03-02");
    let clock = clock_at("2026-03-02 09:50:00");

    let err = handlers::check_in(
        &mut store,
        booking_id,
        &member("alice"),
        Some("9999"),
        &test_cause(),
        &clock,
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));

    let checked_in = handlers::check_in(
        &mut store,
        booking_id,
        &member("alice"),
        Some("4242"),
        &test_cause(),
        &clock,
    )
    .unwrap();
    assert!(!checked_in.already_checked_in);
}

#[test]
fn check_out_completes_booking_and_is_idempotent() {
    let (mut store, resource_id) = test_store();
    store.save_settings(&checkin_settings()).unwrap();
    let booking_id = approved_booking(&mut store, resource_id, "alice", "2026-03-02");

    handlers::check_in(
        &mut store,
        booking_id,
        &member("alice"),
        None,
        &test_cause(),
        &clock_at("2026-03-02 09:50:00"),
    )
    .unwrap();

    let out = handlers::check_out(
        &mut store,
        booking_id,
        &member("alice"),
        &test_cause(),
        &clock_at("2026-03-02 10:55:00"),
    )
    .unwrap();
    assert!(!out.already_checked_out);
    assert_eq!(
        handlers::get_booking(&mut store, booking_id).unwrap().status,
        "completed"
    );

    let again = handlers::check_out(
        &mut store,
        booking_id,
        &member("alice"),
        &test_cause(),
        &clock_at("2026-03-02 11:30:00"),
    )
    .unwrap();
    assert!(again.already_checked_out);
    assert_eq!(again.checked_out_at, "2026-03-02 10:55:00");
}

#[test]
fn check_out_before_check_in_fails() {
    let (mut store, resource_id) = test_store();
    store.save_settings(&checkin_settings()).unwrap();
    let booking_id = approved_booking(&mut store, resource_id, "alice", "2026-03-02");

    let err = handlers::check_out(
        &mut store,
        booking_id,
        &member("alice"),
        &test_cause(),
        &clock_at("2026-03-02 10:30:00"),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));
}

#[test]
fn token_check_in_is_single_use() {
    let (mut store, resource_id) = test_store();
    store.save_settings(&checkin_settings()).unwrap();
    let booking_id = approved_booking(&mut store, resource_id, "alice", "2026-03-02");
    let token = store
        .get_booking(booking_id)
        .unwrap()
        .check_in_token
        .unwrap();
    let clock = clock_at("2026-03-02 09:50:00");

    let checked_in = handlers::check_in_via_token(&mut store, &token, &test_cause(), &clock).unwrap();
    assert!(!checked_in.already_checked_in);

    // The token was consumed on success.
    let err = handlers::check_in_via_token(&mut store, &token, &test_cause(), &clock).unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));
    assert!(store
        .get_booking(booking_id)
        .unwrap()
        .check_in_token
        .is_none());
}

#[test]
fn expired_token_is_cleared_on_detection() {
    let (mut store, resource_id) = test_store();
    store.save_settings(&checkin_settings()).unwrap();
    let booking_id = approved_booking(&mut store, resource_id, "alice", "2026-03-02");
    let token = store
        .get_booking(booking_id)
        .unwrap()
        .check_in_token
        .unwrap();

    // Tokens expire 24h past the booking's end.
    let err = handlers::check_in_via_token(
        &mut store,
        &token,
        &test_cause(),
        &clock_at("2026-03-04 12:00:00"),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));
    assert!(store
        .get_booking(booking_id)
        .unwrap()
        .check_in_token
        .is_none());
}

#[test]
fn unknown_token_fails() {
    let (mut store, _resource_id) = test_store();
    store.save_settings(&checkin_settings()).unwrap();

    let err = handlers::check_in_via_token(
        &mut store,
        "nosuchtoken",
        &test_cause(),
        &clock_at("2026-03-02 09:50:00"),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));
}

#[test]
fn pin_url_check_in_selects_earliest_eligible_booking() {
    let (mut store, resource_id) = test_store();
    store
        .save_settings(&BookingSettings {
            enable_check_in_out: true,
            // Wide window so both bookings are eligible at once.
            check_in_minutes_before: 120,
            check_in_minutes_after: 120,
            ..BookingSettings::default()
        })
        .unwrap();
    store.insert_pin(resource_id, "4242", true).unwrap();

    let mut notifier = RecordingNotifier::default();
    let early = handlers::create_booking(
        &mut store,
        booking_request(resource_id, "2026-03-02", "10:00", "11:00"),
        &member("alice"),
        &AllowAll,
        &mut notifier,
        &test_cause(),
        &clock_at("2026-03-01 09:00:00"),
    )
    .unwrap()
    .bookings[0]
        .booking_id;
    let late = handlers::create_booking(
        &mut store,
        booking_request(resource_id, "2026-03-02", "11:00", "12:00"),
        &member("bob"),
        &AllowAll,
        &mut notifier,
        &test_cause(),
        &clock_at("2026-03-01 09:00:00"),
    )
    .unwrap()
    .bookings[0]
        .booking_id;
    for id in [early, late] {
        handlers::approve_booking(
            &mut store,
            id,
            &admin(),
            &mut notifier,
            &test_cause(),
            &clock_at("2026-03-01 10:00:00"),
        )
        .unwrap();
    }

    // Both windows contain 10:30; the earlier start wins.
    let response = handlers::check_in_via_pin_url(
        &mut store,
        resource_id,
        "4242",
        None,
        &test_cause(),
        &clock_at("2026-03-02 10:30:00"),
    )
    .unwrap();
    assert_eq!(response.booking_id, early);

    // With the early booking checked in, the next scan resolves the other.
    let response = handlers::check_in_via_pin_url(
        &mut store,
        resource_id,
        "4242",
        None,
        &test_cause(),
        &clock_at("2026-03-02 10:30:00"),
    )
    .unwrap();
    assert_eq!(response.booking_id, late);
}

#[test]
fn pin_url_requires_login_when_settings_say_so() {
    let (mut store, resource_id) = test_store();
    store
        .save_settings(&BookingSettings {
            enable_check_in_out: true,
            resource_checkin_url_requires_login: true,
            ..BookingSettings::default()
        })
        .unwrap();
    store.insert_pin(resource_id, "4242", true).unwrap();
    let booking_id = approved_booking(&mut store, resource_id, "alice", "2026-03-02");
    let clock = clock_at("2026-03-02 09:50:00");

    let err = handlers::check_in_via_pin_url(
        &mut store,
        resource_id,
        "4242",
        None,
        &test_cause(),
        &clock,
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));

    let response = handlers::check_in_via_pin_url(
        &mut store,
        resource_id,
        "4242",
        Some("alice"),
        &test_cause(),
        &clock,
    )
    .unwrap();
    assert_eq!(response.booking_id, booking_id);
}

#[test]
fn pin_url_with_no_eligible_booking_fails() {
    let (mut store, resource_id) = test_store();
    store.save_settings(&checkin_settings()).unwrap();
    store.insert_pin(resource_id, "4242", true).unwrap();

    let err = handlers::check_in_via_pin_url(
        &mut store,
        resource_id,
        "4242",
        None,
        &test_cause(),
        &clock_at("2026-03-02 09:50:00"),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));
}
