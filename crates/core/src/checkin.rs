// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Check-in and check-out decision logic.
//!
//! This module decides outcomes; recording them (and clearing tokens) is
//! the persistence layer's job. All paths are idempotent: repeating a
//! successful check-in or check-out returns the already-recorded instant
//! instead of erroring.
//!
//! ## Check-in window
//!
//! Check-in is permitted within `[start - before, start + after]`, where
//! `before` and `after` come from the booking settings, in minutes.

use resv_domain::{Booking, BookingSettings, BookingStatus, DomainError, ResourcePin};
use time::{Duration, OffsetDateTime};

/// The time range around a booking's start during which check-in is
/// permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInWindow {
    /// When the window opens.
    pub opens: OffsetDateTime,
    /// When the window closes.
    pub closes: OffsetDateTime,
}

impl CheckInWindow {
    /// Returns true if `now` lies within the window (inclusive bounds).
    #[must_use]
    pub fn contains(&self, now: OffsetDateTime) -> bool {
        self.opens <= now && now <= self.closes
    }
}

/// Computes the check-in window for a booking start.
#[must_use]
pub fn check_in_window(start: OffsetDateTime, settings: &BookingSettings) -> CheckInWindow {
    CheckInWindow {
        opens: start - Duration::minutes(i64::from(settings.check_in_minutes_before)),
        closes: start + Duration::minutes(i64::from(settings.check_in_minutes_after)),
    }
}

/// The outcome of a check-in decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// First successful check-in; record `checked_in_at = instant` and
    /// advance the status to `checked_in`.
    CheckedIn(OffsetDateTime),
    /// Check-in was already recorded; nothing to persist.
    AlreadyCheckedIn(OffsetDateTime),
}

impl CheckInOutcome {
    /// The check-in instant, whether newly decided or previously recorded.
    #[must_use]
    pub const fn instant(&self) -> OffsetDateTime {
        match self {
            Self::CheckedIn(at) | Self::AlreadyCheckedIn(at) => *at,
        }
    }
}

/// The outcome of a check-out decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutOutcome {
    /// First successful check-out; record `checked_out_at = instant` and
    /// advance the status to `completed`.
    CheckedOut(OffsetDateTime),
    /// Check-out was already recorded; nothing to persist.
    AlreadyCheckedOut(OffsetDateTime),
}

impl CheckOutOutcome {
    /// The check-out instant, whether newly decided or previously recorded.
    #[must_use]
    pub const fn instant(&self) -> OffsetDateTime {
        match self {
            Self::CheckedOut(at) | Self::AlreadyCheckedOut(at) => *at,
        }
    }
}

/// Validates a standard (booking id + identity) check-in.
///
/// Preconditions: check-in/out enabled, status approved (or the legacy
/// `confirmed`), `now` within the check-in window, and a matching active
/// PIN when one is supplied. Re-invocation after success is idempotent.
///
/// # Errors
///
/// Returns `CheckInDisabled`, `InvalidStatusTransition`,
/// `CheckInOutsideWindow`, or `InvalidPin`.
pub fn validate_check_in(
    booking: &Booking,
    settings: &BookingSettings,
    now: OffsetDateTime,
    pin: Option<&str>,
    resource_pins: &[ResourcePin],
) -> Result<CheckInOutcome, DomainError> {
    if !settings.enable_check_in_out {
        return Err(DomainError::CheckInDisabled);
    }

    // Idempotent: a repeated check-in returns the recorded instant.
    if let Some(at) = booking.checked_in_at {
        return Ok(CheckInOutcome::AlreadyCheckedIn(at));
    }

    booking.status.validate_transition(BookingStatus::CheckedIn)?;

    let window = check_in_window(booking.slot.start(), settings);
    if !window.contains(now) {
        return Err(DomainError::CheckInOutsideWindow {
            opens: window.opens,
            closes: window.closes,
            now,
        });
    }

    if let Some(pin) = pin
        && !pin_matches(pin, resource_pins)
    {
        return Err(DomainError::InvalidPin);
    }

    Ok(CheckInOutcome::CheckedIn(now))
}

/// Validates a check-out.
///
/// Preconditions: the booking is checked in. Re-invocation after success is
/// idempotent.
///
/// # Errors
///
/// Returns `CheckInDisabled` or `NotCheckedIn`.
pub fn validate_check_out(
    booking: &Booking,
    settings: &BookingSettings,
    now: OffsetDateTime,
) -> Result<CheckOutOutcome, DomainError> {
    if !settings.enable_check_in_out {
        return Err(DomainError::CheckInDisabled);
    }

    if let Some(at) = booking.checked_out_at {
        return Ok(CheckOutOutcome::AlreadyCheckedOut(at));
    }

    if booking.checked_in_at.is_none() {
        return Err(DomainError::NotCheckedIn {
            booking_id: booking.id,
        });
    }

    Ok(CheckOutOutcome::CheckedOut(now))
}

/// Validates a token (QR) check-in for a booking already resolved by token.
///
/// In addition to the standard check-in preconditions, the token must be
/// present and unexpired. Whatever the outcome of the check-in itself, a
/// successful validation consumes the token: the caller must clear it. An
/// expired token must also be cleared on detection to prevent reuse.
///
/// # Errors
///
/// Returns `TokenExpiredOrInvalid` for a missing or expired token, or any
/// standard check-in error.
pub fn validate_token_check_in(
    booking: &Booking,
    settings: &BookingSettings,
    now: OffsetDateTime,
) -> Result<CheckInOutcome, DomainError> {
    let Some(expires_at) = booking.token_expires_at else {
        return Err(DomainError::TokenExpiredOrInvalid);
    };
    if booking.check_in_token.is_none() || expires_at < now {
        return Err(DomainError::TokenExpiredOrInvalid);
    }

    validate_check_in(booking, settings, now, None, &[])
}

/// Resolves the target booking for a PIN-URL check-in.
///
/// Scans the resource's active, not-yet-checked-in bookings (optionally
/// scoped to `user` when login is required) and selects the one whose
/// check-in window contains `now`, preferring the earliest start on
/// ambiguity.
///
/// # Errors
///
/// Returns `NoEligibleBooking` if nothing qualifies.
pub fn select_eligible_booking<'a>(
    resource_id: i64,
    bookings: &'a [Booking],
    settings: &BookingSettings,
    now: OffsetDateTime,
    user: Option<&str>,
) -> Result<&'a Booking, DomainError> {
    bookings
        .iter()
        .filter(|b| b.resource_id == resource_id)
        .filter(|b| matches!(b.status, BookingStatus::Approved | BookingStatus::Confirmed))
        .filter(|b| b.checked_in_at.is_none())
        .filter(|b| user.is_none_or(|u| b.user_name == u))
        .filter(|b| check_in_window(b.slot.start(), settings).contains(now))
        .min_by_key(|b| b.slot.start())
        .ok_or(DomainError::NoEligibleBooking { resource_id })
}

fn pin_matches(pin: &str, resource_pins: &[ResourcePin]) -> bool {
    resource_pins.iter().any(|p| p.is_active && p.pin == pin)
}
