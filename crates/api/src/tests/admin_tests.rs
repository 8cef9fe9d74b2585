// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Admin lifecycle operations: approve, reject, cancel, acknowledge, and
//! the stale-pending sweep.

use super::{
    RecordingNotifier, admin, booking_request, clock_at, member, test_cause, test_store,
};
use crate::auth::AllowAll;
use crate::error::ApiError;
use crate::handlers;
use resv_persistence::SqlitePersistence;

fn create(store: &mut SqlitePersistence, resource_id: i64, user: &str, date: &str) -> i64 {
    let mut notifier = RecordingNotifier::default();
    handlers::create_booking(
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
        .booking_id
}

#[test]
fn approve_requires_admin_role() {
    let (mut store, resource_id) = test_store();
    let booking_id = create(&mut store, resource_id, "alice", "2026-03-02");
    let mut notifier = RecordingNotifier::default();

    let err = handlers::approve_booking(
        &mut store,
        booking_id,
        &member("alice"),
        &mut notifier,
        &test_cause(),
        &clock_at("2026-03-01 10:00:00"),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));

    let approved = handlers::approve_booking(
        &mut store,
        booking_id,
        &admin(),
        &mut notifier,
        &test_cause(),
        &clock_at("2026-03-01 10:00:00"),
    )
    .unwrap();
    assert_eq!(approved.status, "approved");
    assert_eq!(
        notifier.sent,
        vec![(String::from("alice"), String::from("Booking approved"))]
    );
}

#[test]
fn approve_and_reject_only_from_pending() {
    let (mut store, resource_id) = test_store();
    let booking_id = create(&mut store, resource_id, "alice", "2026-03-02");
    let mut notifier = RecordingNotifier::default();
    let clock = clock_at("2026-03-01 10:00:00");

    handlers::approve_booking(&mut store, booking_id, &admin(), &mut notifier, &test_cause(), &clock)
        .unwrap();

    let err = handlers::approve_booking(
        &mut store,
        booking_id,
        &admin(),
        &mut notifier,
        &test_cause(),
        &clock,
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));

    let err = handlers::reject_booking(
        &mut store,
        booking_id,
        &admin(),
        &mut notifier,
        &test_cause(),
        &clock,
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));
}

#[test]
fn admin_cancel_stores_reason_and_acknowledge_clears_it() {
    let (mut store, resource_id) = test_store();
    let booking_id = create(&mut store, resource_id, "alice", "2026-03-02");
    let mut notifier = RecordingNotifier::default();
    let clock = clock_at("2026-03-01 10:00:00");

    let cancelled = handlers::cancel_booking_by_admin(
        &mut store,
        booking_id,
        Some("Room flooded"),
        &admin(),
        &mut notifier,
        &test_cause(),
        &clock,
    )
    .unwrap();
    assert_eq!(cancelled.status, "cancelled_by_admin");
    assert_eq!(cancelled.admin_message.as_deref(), Some("Room flooded"));

    // The owner acknowledges; the message is cleared, not edited.
    let acknowledged = handlers::clear_admin_message(
        &mut store,
        booking_id,
        &member("alice"),
        &test_cause(),
        &clock,
    )
    .unwrap();
    assert_eq!(acknowledged.status, "cancelled_admin_acknowledged");
    assert!(acknowledged.admin_message.is_none());

    // Acknowledging twice is a sequencing error.
    let err = handlers::clear_admin_message(
        &mut store,
        booking_id,
        &member("alice"),
        &test_cause(),
        &clock,
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));
}

#[test]
fn completed_booking_cannot_be_admin_cancelled() {
    let (mut store, resource_id) = test_store();
    let booking_id = create(&mut store, resource_id, "alice", "2026-03-02");
    let mut notifier = RecordingNotifier::default();
    let clock = clock_at("2026-03-01 10:00:00");

    handlers::reject_booking(&mut store, booking_id, &admin(), &mut notifier, &test_cause(), &clock)
        .unwrap();

    let err = handlers::cancel_booking_by_admin(
        &mut store,
        booking_id,
        None,
        &admin(),
        &mut notifier,
        &test_cause(),
        &clock,
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::StateTransitionError { .. }));
}

#[test]
fn stale_pending_sweep_cancels_only_old_pending() {
    let (mut store, resource_id) = test_store();
    let stale = create(&mut store, resource_id, "alice", "2026-03-02");
    let upcoming = create(&mut store, resource_id, "bob", "2026-03-20");

    // A day after the first booking's start plus margin.
    let response = handlers::cancel_stale_pending_bookings(
        &mut store,
        24,
        &admin(),
        &test_cause(),
        &clock_at("2026-03-04 12:00:00"),
    )
    .unwrap();
    assert_eq!(response.cancelled, 1);
    assert_eq!(
        handlers::get_booking(&mut store, stale).unwrap().status,
        "cancelled_by_admin"
    );
    assert_eq!(
        handlers::get_booking(&mut store, upcoming).unwrap().status,
        "pending"
    );

    // Sweeping again finds nothing; the operation is idempotent.
    let response = handlers::cancel_stale_pending_bookings(
        &mut store,
        24,
        &admin(),
        &test_cause(),
        &clock_at("2026-03-04 12:00:00"),
    )
    .unwrap();
    assert_eq!(response.cancelled, 0);

    let err = handlers::cancel_stale_pending_bookings(
        &mut store,
        24,
        &member("alice"),
        &test_cause(),
        &clock_at("2026-03-04 12:00:00"),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
}
