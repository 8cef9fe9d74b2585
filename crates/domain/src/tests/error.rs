// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use time::macros::datetime;

#[test]
fn test_error_messages_are_human_readable() {
    let err = DomainError::PastBookingNotAllowed {
        start: datetime!(2024-01-01 08:00 UTC),
    };
    assert!(err.to_string().contains("past"));

    let err = DomainError::QuotaExceeded {
        existing: 2,
        requested: 1,
        max: 2,
    };
    assert!(err.to_string().contains("quota"));

    let err = DomainError::RecurrenceLimitExceeded {
        requested: 10,
        max: 4,
    };
    assert!(err.to_string().contains("10"));
    assert!(err.to_string().contains('4'));
}

#[test]
fn test_maintenance_message_distinguishes_indefinite() {
    let bounded = DomainError::ResourceUnderMaintenance {
        resource_id: 3,
        until: Some(datetime!(2024-02-01 00:00 UTC)),
    };
    assert!(bounded.to_string().contains("until"));

    let indefinite = DomainError::ResourceUnderMaintenance {
        resource_id: 3,
        until: None,
    };
    assert!(indefinite.to_string().contains("indefinitely"));
}

#[test]
fn test_error_implements_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(DomainError::InvalidPin);
    assert!(!err.to_string().is_empty());
}
