// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod series_tests;

use crate::SqlitePersistence;
use resv::BookingRequest;
use resv_audit::{Action, Actor, AuditEvent, Cause};
use resv_domain::{Resource, TimeSlot, parse_instant};
use time::OffsetDateTime;

pub fn test_store() -> SqlitePersistence {
    SqlitePersistence::in_memory().unwrap()
}

pub fn instant(value: &str) -> OffsetDateTime {
    parse_instant(value).unwrap()
}

pub fn slot(start: &str, end: &str) -> TimeSlot {
    TimeSlot::new(instant(start), instant(end)).unwrap()
}

pub fn seed_resource(store: &mut SqlitePersistence) -> i64 {
    let resource = Resource {
        id: 0,
        name: String::from("Conference Room A"),
        capacity: 8,
        is_under_maintenance: false,
        maintenance_until: None,
        max_recurrence_count: Some(10),
    };
    store.insert_resource(&resource).unwrap()
}

pub fn request_for(resource_id: i64, user: &str, base_slot: TimeSlot) -> BookingRequest {
    BookingRequest {
        resource_id,
        user_name: user.to_string(),
        title: String::from("Team sync"),
        base_slot,
        recurrence: None,
    }
}

pub fn test_event(action: &str) -> AuditEvent {
    AuditEvent::new(
        Actor::new(String::from("test-admin"), String::from("admin")),
        Cause::new(String::from("test-cause"), String::from("Test operation")),
        Action::new(action.to_string(), None),
        None,
        None,
    )
}
