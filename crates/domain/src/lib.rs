// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod clock;
mod error;
mod policy;
mod recurrence;
mod status;
mod types;

#[cfg(test)]
mod tests;

// Re-export public types
pub use clock::{
    Clock, FixedClock, SystemClock, format_instant, parse_instant, parse_slot,
};
pub use error::DomainError;
pub use policy::{
    PolicyInputs, check_future_horizon, check_maintenance, check_past_window, check_quota,
    evaluate_policies,
};
pub use recurrence::{Frequency, RecurrenceRule, check_recurrence_limit, expand};
pub use status::BookingStatus;
pub use types::{
    Booking, BookingSettings, Resource, ResourcePin, TimeSlot, WaitlistEntry,
};
