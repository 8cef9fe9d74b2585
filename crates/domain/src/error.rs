// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::{Date, OffsetDateTime};

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The requested time range is invalid (end not after start, out of range).
    InvalidTimeRange {
        /// Description of the validation failure.
        reason: String,
    },
    /// Failed to parse a date or time from a string.
    DateParseError {
        /// The invalid date/time string.
        value: String,
        /// The parsing error message.
        error: String,
    },
    /// The recurrence rule string is malformed.
    InvalidRecurrenceRule {
        /// The offending rule string.
        rule: String,
        /// Description of what is malformed.
        reason: String,
    },
    /// The parsed recurrence count exceeds the resource's configured cap.
    RecurrenceLimitExceeded {
        /// The requested occurrence count.
        requested: u32,
        /// The resource's maximum recurrence count.
        max: u32,
    },
    /// Past bookings are disabled and the occurrence starts before now.
    PastBookingNotAllowed {
        /// The occurrence start.
        start: OffsetDateTime,
    },
    /// The occurrence starts before the adjusted past-booking cutoff.
    OutsideAllowedWindow {
        /// The occurrence start.
        start: OffsetDateTime,
        /// The earliest permitted start.
        cutoff: OffsetDateTime,
    },
    /// The occurrence lies beyond the future booking horizon.
    TooFarInFuture {
        /// The occurrence date.
        date: Date,
        /// The latest permitted date.
        latest: Date,
    },
    /// The resource is under maintenance for the requested occurrence.
    ResourceUnderMaintenance {
        /// The resource identifier.
        resource_id: i64,
        /// Maintenance end, if bounded. `None` means indefinite.
        until: Option<OffsetDateTime>,
    },
    /// The user's active booking count would exceed the configured quota.
    QuotaExceeded {
        /// The user's current active booking count.
        existing: u32,
        /// The number of occurrences requested.
        requested: u32,
        /// The configured per-user maximum.
        max: u32,
    },
    /// The user already holds an overlapping booking on another resource.
    ConcurrentResourceConflict {
        /// The conflicting booking's identifier.
        booking_id: i64,
        /// The resource the conflicting booking is on.
        resource_id: i64,
    },
    /// A stored status string is not a recognized booking status.
    InvalidStatus {
        /// The unrecognized status string.
        status: String,
    },
    /// A status transition violates the booking lifecycle.
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition is not permitted.
        reason: String,
    },
    /// Check-in/check-out is disabled in the booking settings.
    CheckInDisabled,
    /// The current time lies outside the booking's check-in window.
    CheckInOutsideWindow {
        /// When the window opens.
        opens: OffsetDateTime,
        /// When the window closes.
        closes: OffsetDateTime,
        /// The current time.
        now: OffsetDateTime,
    },
    /// The supplied PIN does not match an active PIN for the resource.
    InvalidPin,
    /// The check-in token is unknown, already used, or expired.
    TokenExpiredOrInvalid,
    /// Check-out requested before check-in.
    NotCheckedIn {
        /// The booking identifier.
        booking_id: i64,
    },
    /// No booking on the resource is currently eligible for check-in.
    NoEligibleBooking {
        /// The resource identifier.
        resource_id: i64,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeRange { reason } => write!(f, "Invalid time range: {reason}"),
            Self::DateParseError { value, error } => {
                write!(f, "Failed to parse date/time '{value}': {error}")
            }
            Self::InvalidRecurrenceRule { rule, reason } => {
                write!(f, "Invalid recurrence rule '{rule}': {reason}")
            }
            Self::RecurrenceLimitExceeded { requested, max } => {
                write!(
                    f,
                    "Recurrence count {requested} exceeds the resource maximum of {max}"
                )
            }
            Self::PastBookingNotAllowed { start } => {
                write!(f, "Booking starting at {start} lies in the past")
            }
            Self::OutsideAllowedWindow { start, cutoff } => {
                write!(
                    f,
                    "Booking starting at {start} is before the allowed cutoff {cutoff}"
                )
            }
            Self::TooFarInFuture { date, latest } => {
                write!(
                    f,
                    "Booking on {date} exceeds the future horizon; latest permitted date is {latest}"
                )
            }
            Self::ResourceUnderMaintenance { resource_id, until } => match until {
                Some(until) => write!(
                    f,
                    "Resource {resource_id} is under maintenance until {until}"
                ),
                None => write!(f, "Resource {resource_id} is under maintenance indefinitely"),
            },
            Self::QuotaExceeded {
                existing,
                requested,
                max,
            } => {
                write!(
                    f,
                    "Booking quota exceeded: {existing} active plus {requested} requested exceeds the maximum of {max}"
                )
            }
            Self::ConcurrentResourceConflict {
                booking_id,
                resource_id,
            } => {
                write!(
                    f,
                    "User already holds overlapping booking {booking_id} on resource {resource_id}"
                )
            }
            Self::InvalidStatus { status } => write!(f, "Invalid booking status: '{status}'"),
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Cannot transition booking from '{from}' to '{to}': {reason}")
            }
            Self::CheckInDisabled => write!(f, "Check-in/check-out is disabled"),
            Self::CheckInOutsideWindow { opens, closes, now } => {
                write!(
                    f,
                    "Check-in window is {opens} to {closes}, but the current time is {now}"
                )
            }
            Self::InvalidPin => write!(f, "The supplied PIN is not valid for this resource"),
            Self::TokenExpiredOrInvalid => {
                write!(f, "The check-in token is invalid or has expired")
            }
            Self::NotCheckedIn { booking_id } => {
                write!(f, "Booking {booking_id} has not been checked in")
            }
            Self::NoEligibleBooking { resource_id } => {
                write!(
                    f,
                    "No booking on resource {resource_id} is currently eligible for check-in"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
