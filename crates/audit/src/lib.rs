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
    clippy::all
)]

use resv_domain::BookingStatus;

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change.
/// This could be a user, an admin, or an automated trigger such as the
/// stale-pending sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "member", "admin", "scheduler").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }
}

/// Represents the reason or trigger for an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// A unique identifier for this cause (e.g., request ID).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The name of the action (e.g., "`CreateBooking`", "`CheckIn`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// A snapshot of one booking's audit-relevant state at a point in time.
///
/// `None` represents "the booking does not exist" (before creation, after
/// deletion).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSnapshot {
    /// The booking's identifier.
    pub booking_id: i64,
    /// The resource the booking is on.
    pub resource_id: i64,
    /// The owning user's name.
    pub user_name: String,
    /// The booking's status at snapshot time.
    pub status: BookingStatus,
    /// The reserved interval, formatted as stored.
    pub slot: String,
}

impl BookingSnapshot {
    /// Creates a new `BookingSnapshot`.
    #[must_use]
    pub const fn new(
        booking_id: i64,
        resource_id: i64,
        user_name: String,
        status: BookingStatus,
        slot: String,
    ) -> Self {
        Self {
            booking_id,
            resource_id,
            user_name,
            status,
            slot,
        }
    }
}

/// An immutable audit event representing a state transition.
///
/// Every successful state change must produce exactly one audit event.
/// Audit events are immutable once created and capture:
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - The booking before the transition (before)
/// - The booking after the transition (after)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// The actor who initiated this state change.
    pub actor: Actor,
    /// The cause or reason for this state change.
    pub cause: Cause,
    /// The action that was performed.
    pub action: Action,
    /// The booking before the transition, if it existed.
    pub before: Option<BookingSnapshot>,
    /// The booking after the transition, if it still exists.
    pub after: Option<BookingSnapshot>,
}

impl AuditEvent {
    /// Creates a new `AuditEvent`.
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        before: Option<BookingSnapshot>,
        after: Option<BookingSnapshot>,
    ) -> Self {
        Self {
            actor,
            cause,
            action,
            before,
            after,
        }
    }
}
