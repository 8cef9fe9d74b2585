// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::conflict::ConflictError;
use resv_domain::DomainError;

/// Errors that can occur while evaluating a booking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule (validation or policy) was violated.
    DomainViolation(DomainError),
    /// The requested slot conflicts with an existing booking.
    Conflict(ConflictError),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::Conflict(err) => write!(f, "Booking conflict: {err}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

impl From<ConflictError> for CoreError {
    fn from(err: ConflictError) -> Self {
        Self::Conflict(err)
    }
}
