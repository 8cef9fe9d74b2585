// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use resv_domain::{Booking, BookingSettings, Resource};

/// A consistent snapshot of everything the engine needs to evaluate one
/// booking request for one resource and one user.
///
/// The persistence layer assembles this inside the same transaction that
/// later inserts the series, so the conflict check and the insert cannot
/// interleave with a concurrent request for the same resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchedule {
    /// The resource being booked.
    pub resource: Resource,
    /// The singleton booking settings (or defaults).
    pub settings: BookingSettings,
    /// Active bookings on this resource.
    pub resource_bookings: Vec<Booking>,
    /// The requesting user's active bookings on other resources.
    pub user_other_bookings: Vec<Booking>,
    /// The requesting user's total active booking count (all resources).
    pub user_active_count: u32,
    /// Current number of waitlist entries for this resource.
    pub waitlist_len: u32,
    /// Maximum waitlist entries permitted for this resource.
    pub waitlist_cap: u32,
    /// Whether the requesting user already has a waitlist entry here.
    pub user_on_waitlist: bool,
}
