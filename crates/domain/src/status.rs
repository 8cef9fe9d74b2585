// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking status tracking and transition logic.
//!
//! This module defines booking lifecycle states and valid transitions.
//! The source system stored statuses as free-text strings compared
//! case-insensitively after trimming; here the set is closed and unknown
//! values are rejected at the persistence boundary instead.
//!
//! ## Lifecycle
//!
//! ```text
//! pending -> approved -> checked_in -> completed
//! pending -> rejected
//! pending|approved|confirmed|checked_in -> cancelled_by_admin
//! cancelled_by_admin -> cancelled_admin_acknowledged
//! ```
//!
//! `confirmed` is a legacy alias for an approved booking carried over from
//! imported data; it counts as active and behaves like `approved`.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Booking lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Awaiting admin approval.
    Pending,
    /// Approved and ready for check-in.
    Approved,
    /// Legacy approved state from imported data. Active; treated as approved.
    Confirmed,
    /// The user has checked in.
    CheckedIn,
    /// The user has checked out.
    Completed,
    /// Rejected by an admin.
    Rejected,
    /// Cancelled by an admin; an explanatory message may be attached.
    CancelledByAdmin,
    /// The owner acknowledged the admin cancellation and its message.
    CancelledAdminAcknowledged,
}

impl BookingStatus {
    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Confirmed => "confirmed",
            Self::CheckedIn => "checked_in",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::CancelledByAdmin => "cancelled_by_admin",
            Self::CancelledAdminAcknowledged => "cancelled_admin_acknowledged",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// Input is trimmed and lowercased first, matching how the source
    /// system compared stored status strings.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatus` if the string is not a valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "confirmed" => Ok(Self::Confirmed),
            "checked_in" => Ok(Self::CheckedIn),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "cancelled_by_admin" => Ok(Self::CancelledByAdmin),
            "cancelled_admin_acknowledged" => Ok(Self::CancelledAdminAcknowledged),
            _ => Err(DomainError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status counts toward conflict and quota checks.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Approved | Self::Confirmed | Self::CheckedIn
        )
    }

    /// Returns true if this status is terminal (cannot transition further).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Rejected | Self::CancelledAdminAcknowledged
        )
    }

    /// Returns true if an admin may cancel a booking in this status.
    #[must_use]
    pub const fn is_admin_cancellable(&self) -> bool {
        !matches!(
            self,
            Self::Completed
                | Self::Rejected
                | Self::CancelledByAdmin
                | Self::CancelledAdminAcknowledged
        )
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        // Cannot transition from terminal states
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from terminal state".to_string(),
            });
        }

        let valid = match self {
            Self::Pending => matches!(
                new_status,
                Self::Approved | Self::Rejected | Self::CancelledByAdmin
            ),
            Self::Approved | Self::Confirmed => {
                matches!(new_status, Self::CheckedIn | Self::CancelledByAdmin)
            }
            Self::CheckedIn => matches!(new_status, Self::Completed | Self::CancelledByAdmin),
            Self::CancelledByAdmin => matches!(new_status, Self::CancelledAdminAcknowledged),
            Self::Completed | Self::Rejected | Self::CancelledAdminAcknowledged => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by booking lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
