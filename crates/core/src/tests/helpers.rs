// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::schedule::ResourceSchedule;
use resv_domain::{Booking, BookingSettings, BookingStatus, Resource, TimeSlot};
use time::OffsetDateTime;

pub fn test_resource() -> Resource {
    Resource {
        id: 1,
        name: String::from("Room R"),
        capacity: 6,
        is_under_maintenance: false,
        maintenance_until: None,
        max_recurrence_count: None,
    }
}

pub fn slot(start: OffsetDateTime, end: OffsetDateTime) -> TimeSlot {
    #[allow(clippy::unwrap_used)]
    TimeSlot::new(start, end).unwrap()
}

pub fn booking(id: i64, resource_id: i64, user: &str, slot: TimeSlot) -> Booking {
    Booking {
        id,
        resource_id,
        user_name: user.to_string(),
        title: format!("Booking {id}"),
        slot,
        status: BookingStatus::Approved,
        recurrence_rule: None,
        admin_message: None,
        checked_in_at: None,
        checked_out_at: None,
        check_in_token: None,
        token_expires_at: None,
    }
}

pub fn empty_schedule() -> ResourceSchedule {
    let settings = BookingSettings::default();
    let waitlist_cap = settings.waitlist_cap;
    ResourceSchedule {
        resource: test_resource(),
        settings,
        resource_bookings: Vec::new(),
        user_other_bookings: Vec::new(),
        user_active_count: 0,
        waitlist_len: 0,
        waitlist_cap,
        user_on_waitlist: false,
    }
}
