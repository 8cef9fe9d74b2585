// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.
//!
//! Domain and core errors are translated explicitly into the API
//! taxonomy; persistence failures become a generic internal error so
//! database detail never reaches the caller.

use resv::{ConflictError, CoreError};
use resv_domain::DomainError;
use resv_persistence::PersistenceError;
use tracing::error;

/// Authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The actor does not have permission for this action.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A member tried to act on another user's booking.
    NotOwner {
        /// The action that was attempted.
        action: String,
        /// The booking involved.
        booking_id: i64,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::NotOwner { action, booking_id } => {
                write!(
                    f,
                    "Unauthorized: '{action}' on booking {booking_id} is limited to its owner"
                )
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// A human-readable description of the requirement.
        message: String,
    },
    /// Malformed input: bad time format, missing fields, bad rule syntax.
    /// User-correctable.
    ValidationError {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A booking policy turned the request down. Surfaced verbatim,
    /// never retried.
    PolicyViolation {
        /// The policy that rejected the request.
        rule: String,
        /// A human-readable reason.
        message: String,
    },
    /// The requested slot collides with an existing booking.
    Conflict {
        /// A human-readable description naming the conflicting booking.
        message: String,
        /// Whether the caller was enrolled on the resource's waitlist.
        enrolled_on_waitlist: bool,
    },
    /// The booking is in the wrong state for the attempted action.
    StateTransitionError {
        /// A human-readable description of the sequencing error.
        message: String,
    },
    /// A requested entity was not found.
    NotFound {
        /// The type of entity that was not found.
        entity: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An internal error occurred. Detail is logged, not surfaced.
    Internal {
        /// A generic description safe to show the caller.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized { action, message } => {
                write!(f, "Unauthorized ({action}): {message}")
            }
            Self::ValidationError { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::PolicyViolation { rule, message } => {
                write!(f, "Policy violation ({rule}): {message}")
            }
            Self::Conflict {
                message,
                enrolled_on_waitlist,
            } => {
                if *enrolled_on_waitlist {
                    write!(f, "Conflict: {message} (added to waitlist)")
                } else {
                    write!(f, "Conflict: {message}")
                }
            }
            Self::StateTransitionError { message } => {
                write!(f, "Invalid state transition: {message}")
            }
            Self::NotFound { entity, message } => {
                write!(f, "{entity} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                message: format!("requires {required_role} role"),
            },
            AuthError::NotOwner { action, booking_id } => Self::Unauthorized {
                action,
                message: format!("booking {booking_id} belongs to another user"),
            },
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked
/// directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidTimeRange { reason } => ApiError::ValidationError {
            field: String::from("time_range"),
            message: reason,
        },
        DomainError::DateParseError { value, error } => ApiError::ValidationError {
            field: String::from("date"),
            message: format!("could not parse '{value}': {error}"),
        },
        DomainError::InvalidRecurrenceRule { rule, reason } => ApiError::ValidationError {
            field: String::from("recurrence_rule"),
            message: format!("'{rule}': {reason}"),
        },
        DomainError::InvalidStatus { status } => ApiError::ValidationError {
            field: String::from("status"),
            message: format!("unknown status '{status}'"),
        },
        DomainError::RecurrenceLimitExceeded { requested, max } => ApiError::PolicyViolation {
            rule: String::from("recurrence_limit"),
            message: format!("{requested} occurrences requested, resource allows at most {max}"),
        },
        DomainError::PastBookingNotAllowed { .. }
        | DomainError::OutsideAllowedWindow { .. } => ApiError::PolicyViolation {
            rule: String::from("past_booking"),
            message: err.to_string(),
        },
        DomainError::TooFarInFuture { .. } => ApiError::PolicyViolation {
            rule: String::from("future_horizon"),
            message: err.to_string(),
        },
        DomainError::ResourceUnderMaintenance { .. } => ApiError::PolicyViolation {
            rule: String::from("maintenance"),
            message: err.to_string(),
        },
        DomainError::QuotaExceeded { .. } => ApiError::PolicyViolation {
            rule: String::from("user_quota"),
            message: err.to_string(),
        },
        DomainError::ConcurrentResourceConflict { .. } => ApiError::PolicyViolation {
            rule: String::from("single_resource"),
            message: err.to_string(),
        },
        DomainError::InvalidStatusTransition { .. }
        | DomainError::CheckInDisabled
        | DomainError::CheckInOutsideWindow { .. }
        | DomainError::InvalidPin
        | DomainError::TokenExpiredOrInvalid
        | DomainError::NotCheckedIn { .. }
        | DomainError::NoEligibleBooking { .. } => ApiError::StateTransitionError {
            message: err.to_string(),
        },
    }
}

/// Translates a core engine error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError, enrolled_on_waitlist: bool) -> ApiError {
    match err {
        CoreError::DomainViolation(domain) => translate_domain_error(domain),
        CoreError::Conflict(conflict) => match conflict {
            ConflictError::SlotConflict { .. } | ConflictError::UserOverlap { .. } => {
                ApiError::Conflict {
                    message: conflict.to_string(),
                    enrolled_on_waitlist,
                }
            }
        },
    }
}

/// Translates a persistence error, logging internal detail rather than
/// surfacing it.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::Rejected(rejection) => {
            let enrolled = rejection.waitlist == Some(resv::WaitlistDecision::Enroll);
            translate_core_error(rejection.error, enrolled)
        }
        PersistenceError::ResourceNotFound(id) => ApiError::NotFound {
            entity: String::from("Resource"),
            message: format!("resource {id} does not exist"),
        },
        PersistenceError::BookingNotFound(id) => ApiError::NotFound {
            entity: String::from("Booking"),
            message: format!("booking {id} does not exist"),
        },
        err => {
            error!(error = %err, "Persistence failure");
            ApiError::Internal {
                message: String::from("a storage error occurred"),
            }
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}
