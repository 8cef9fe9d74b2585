// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod admin_tests;
mod checkin_tests;

use crate::auth::{AuthenticatedActor, Role};
use crate::notify::Notifier;
use crate::request_response::CreateBookingRequest;
use resv_audit::Cause;
use resv_domain::{BookingSettings, FixedClock, Resource, parse_instant};
use resv_persistence::SqlitePersistence;
use time::OffsetDateTime;

pub fn test_store() -> (SqlitePersistence, i64) {
    let mut store = SqlitePersistence::in_memory().unwrap();
    let resource_id = store
        .insert_resource(&Resource {
            id: 0,
            name: String::from("Conference Room A"),
            capacity: 8,
            is_under_maintenance: false,
            maintenance_until: None,
            max_recurrence_count: Some(10),
        })
        .unwrap();
    (store, resource_id)
}

pub fn clock_at(value: &str) -> FixedClock {
    FixedClock(instant(value))
}

pub fn instant(value: &str) -> OffsetDateTime {
    parse_instant(value).unwrap()
}

pub fn admin() -> AuthenticatedActor {
    AuthenticatedActor::new(String::from("root"), Role::Admin)
}

pub fn member(name: &str) -> AuthenticatedActor {
    AuthenticatedActor::new(name.to_string(), Role::Member)
}

pub fn test_cause() -> Cause {
    Cause::new(String::from("test"), String::from("Test operation"))
}

pub fn booking_request(resource_id: i64, date: &str, start: &str, end: &str) -> CreateBookingRequest {
    CreateBookingRequest {
        resource_id,
        date: date.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        title: String::from("Team sync"),
        recurrence_rule: None,
    }
}

/// Settings with check-in/out enabled and a 15/15-minute window.
pub fn checkin_settings() -> BookingSettings {
    BookingSettings {
        enable_check_in_out: true,
        ..BookingSettings::default()
    }
}

/// Notifier that records every dispatched message.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Vec<(String, String)>,
}

impl Notifier for RecordingNotifier {
    fn dispatch(&mut self, recipient: &str, subject: &str, _body: &str) -> Result<(), String> {
        self.sent.push((recipient.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Notifier that fails every dispatch.
#[derive(Debug, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn dispatch(&mut self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), String> {
        Err(String::from("smtp unreachable"))
    }
}
