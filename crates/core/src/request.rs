// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use resv_domain::{RecurrenceRule, TimeSlot};

/// A booking request represents user intent as data only.
///
/// Requests are the only way to ask the engine for a new series. The
/// recurrence rule, if present, has already been parsed; the resource-level
/// recurrence cap is checked during evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    /// The resource being booked.
    pub resource_id: i64,
    /// The requesting user's name.
    pub user_name: String,
    /// The booking title.
    pub title: String,
    /// The first (or only) occurrence.
    pub base_slot: TimeSlot,
    /// Optional parsed recurrence rule.
    pub recurrence: Option<RecurrenceRule>,
}
