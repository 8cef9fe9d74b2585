// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Recurrence rule parsing and series expansion.
//!
//! The supported grammar is deliberately small: `FREQ=DAILY|WEEKLY;COUNT=<n>`.
//!
//! ## Invariants
//!
//! - Expansion of a rule with count `n` yields exactly `n` occurrences in
//!   chronological order, starting with the base slot
//! - `DAILY` advances successive occurrences by 1 day, `WEEKLY` by 7
//! - A resource-level maximum recurrence count is enforced before expansion
//!
//! An unrecognized frequency token collapses the rule to a single occurrence
//! with count forced to 1. This matches the source system's behavior; it
//! looks more like a latent bug than a feature, so tests pin it down and
//! product has been asked whether it should become a hard error.

use crate::error::DomainError;
use crate::types::TimeSlot;

/// Supported recurrence frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Successive occurrences are 1 day apart.
    Daily,
    /// Successive occurrences are 7 days apart.
    Weekly,
}

impl Frequency {
    /// Days between successive occurrences.
    #[must_use]
    pub const fn interval_days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
        }
    }
}

/// A parsed recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    /// The parsed frequency. `None` means the frequency token was
    /// unrecognized and the rule degrades to a single occurrence.
    pub frequency: Option<Frequency>,
    /// Number of occurrences to generate (>= 1).
    pub count: u32,
    /// The original rule string, stored verbatim on every generated booking.
    pub raw: String,
}

impl RecurrenceRule {
    /// Parses a rule string of the form `FREQ=DAILY;COUNT=5`.
    ///
    /// Keys may appear in either order; matching is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRecurrenceRule` if the string does not
    /// have exactly a `FREQ` and a `COUNT` part, or if the count is not a
    /// positive integer. An unrecognized frequency is NOT an error; see the
    /// module docs.
    pub fn parse(rule: &str) -> Result<Self, DomainError> {
        let mut freq_token: Option<String> = None;
        let mut count_token: Option<String> = None;

        for part in rule.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let Some((key, value)) = part.split_once('=') else {
                return Err(DomainError::InvalidRecurrenceRule {
                    rule: rule.to_string(),
                    reason: format!("component '{part}' is not a KEY=VALUE pair"),
                });
            };
            match key.trim().to_uppercase().as_str() {
                "FREQ" => freq_token = Some(value.trim().to_uppercase()),
                "COUNT" => count_token = Some(value.trim().to_string()),
                other => {
                    return Err(DomainError::InvalidRecurrenceRule {
                        rule: rule.to_string(),
                        reason: format!("unknown key '{other}'"),
                    });
                }
            }
        }

        let Some(freq_token) = freq_token else {
            return Err(DomainError::InvalidRecurrenceRule {
                rule: rule.to_string(),
                reason: "missing FREQ".to_string(),
            });
        };
        let Some(count_token) = count_token else {
            return Err(DomainError::InvalidRecurrenceRule {
                rule: rule.to_string(),
                reason: "missing COUNT".to_string(),
            });
        };

        let count: u32 =
            count_token
                .parse()
                .map_err(|_| DomainError::InvalidRecurrenceRule {
                    rule: rule.to_string(),
                    reason: format!("COUNT '{count_token}' is not a positive integer"),
                })?;
        if count == 0 {
            return Err(DomainError::InvalidRecurrenceRule {
                rule: rule.to_string(),
                reason: "COUNT must be at least 1".to_string(),
            });
        }

        match freq_token.as_str() {
            "DAILY" => Ok(Self {
                frequency: Some(Frequency::Daily),
                count,
                raw: rule.to_string(),
            }),
            "WEEKLY" => Ok(Self {
                frequency: Some(Frequency::Weekly),
                count,
                raw: rule.to_string(),
            }),
            // Unrecognized frequency degrades to a single occurrence.
            _ => Ok(Self {
                frequency: None,
                count: 1,
                raw: rule.to_string(),
            }),
        }
    }
}

/// Checks a parsed rule against a resource's recurrence cap.
///
/// # Errors
///
/// Returns `DomainError::RecurrenceLimitExceeded` if the rule's count
/// exceeds the cap. A `None` cap permits any count.
pub fn check_recurrence_limit(
    rule: &RecurrenceRule,
    max: Option<u32>,
) -> Result<(), DomainError> {
    if let Some(max) = max
        && rule.count > max
    {
        return Err(DomainError::RecurrenceLimitExceeded {
            requested: rule.count,
            max,
        });
    }
    Ok(())
}

/// Expands a rule into concrete occurrence slots.
///
/// With no rule the series is exactly the base slot. With a rule, each
/// successive occurrence is shifted by the frequency's interval.
#[must_use]
pub fn expand(rule: Option<&RecurrenceRule>, base: TimeSlot) -> Vec<TimeSlot> {
    let Some(rule) = rule else {
        return vec![base];
    };
    let Some(frequency) = rule.frequency else {
        return vec![base];
    };

    let interval = frequency.interval_days();
    (0..i64::from(rule.count))
        .map(|i| base.shifted_by_days(i * interval))
        .collect()
}
