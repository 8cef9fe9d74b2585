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

mod checkin;
mod conflict;
mod error;
mod evaluate;
mod request;
mod schedule;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use checkin::{
    CheckInOutcome, CheckInWindow, CheckOutOutcome, check_in_window, select_eligible_booking,
    validate_check_in, validate_check_out, validate_token_check_in,
};
pub use conflict::{ConflictError, WaitlistDecision, detect_conflicts, find_overlapping};
pub use error::CoreError;
pub use evaluate::{Rejection, ValidatedSeries, evaluate_booking_request};
pub use request::BookingRequest;
pub use schedule::ResourceSchedule;
