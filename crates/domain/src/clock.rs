// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Time normalization for the booking engine.
//!
//! Stored timestamps are naive `YYYY-MM-DD HH:MM:SS` strings interpreted as
//! UTC. This module is the single point where naive values become aware
//! `OffsetDateTime`s; no other code may compare naive and aware instants.
//!
//! "Now" is always taken from a [`Clock`] so that window checks are
//! deterministic under test.

use crate::error::DomainError;
use crate::types::TimeSlot;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

/// Storage format for naive-but-UTC timestamps.
const INSTANT_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

const TIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]");

/// Source of the current instant for all window checks.
pub trait Clock {
    /// The current instant in UTC.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock pinned to a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now_utc(&self) -> OffsetDateTime {
        self.0
    }
}

/// Parses a stored `YYYY-MM-DD HH:MM:SS` timestamp as a UTC instant.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the string does not match the
/// storage format.
pub fn parse_instant(value: &str) -> Result<OffsetDateTime, DomainError> {
    PrimitiveDateTime::parse(value, INSTANT_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| DomainError::DateParseError {
            value: value.to_string(),
            error: e.to_string(),
        })
}

/// Formats a UTC instant in the naive storage format.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimeRange` if formatting fails, which only
/// happens for instants outside the representable storage range.
pub fn format_instant(instant: OffsetDateTime) -> Result<String, DomainError> {
    let naive = PrimitiveDateTime::new(instant.date(), instant.time());
    naive
        .format(INSTANT_FORMAT)
        .map_err(|e| DomainError::InvalidTimeRange {
            reason: format!("cannot format instant {instant}: {e}"),
        })
}

/// Parses a requested booking slot from its date and time components.
///
/// The date is `YYYY-MM-DD` and the times are `HH:MM`, all interpreted as
/// UTC. The resulting slot must have its end strictly after its start.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if a component does not parse, or
/// `DomainError::InvalidTimeRange` if the range is reversed or empty.
pub fn parse_slot(date: &str, start_time: &str, end_time: &str) -> Result<TimeSlot, DomainError> {
    let date = Date::parse(date, DATE_FORMAT).map_err(|e| DomainError::DateParseError {
        value: date.to_string(),
        error: e.to_string(),
    })?;
    let start = parse_time(start_time)?;
    let end = parse_time(end_time)?;

    TimeSlot::new(
        PrimitiveDateTime::new(date, start).assume_utc(),
        PrimitiveDateTime::new(date, end).assume_utc(),
    )
}

fn parse_time(value: &str) -> Result<Time, DomainError> {
    Time::parse(value, TIME_FORMAT).map_err(|e| DomainError::DateParseError {
        value: value.to_string(),
        error: e.to_string(),
    })
}
