// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authorization types and services.

use resv_audit::Actor;
use resv_domain::{Booking, Resource};

use crate::error::AuthError;

/// Actor roles for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Admin role: may approve, reject, and cancel any booking, manage
    /// resources and settings, and trigger maintenance sweeps.
    Admin,
    /// Member role: may create bookings and edit, delete, check in and
    /// check out their own.
    Member,
}

/// An authenticated actor with an associated role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The actor's user name; bookings are owned by this value.
    pub user_name: String,
    /// The role assigned to this actor.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(user_name: String, role: Role) -> Self {
        Self { user_name, role }
    }

    /// Converts this actor into an audit Actor for event attribution.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        let actor_type = match self.role {
            Role::Admin => String::from("admin"),
            Role::Member => String::from("member"),
        };
        Actor::new(self.user_name.clone(), actor_type)
    }
}

/// Pluggable permission check consulted before a booking is created.
///
/// The host application decides whether a user may book a resource at
/// all (membership tiers, bans, opening hours ownership). A denial is
/// surfaced as a policy violation.
pub trait PermissionCheck {
    /// Returns true if `user_name` may book `resource`.
    fn allows(&self, user_name: &str, resource: &Resource) -> bool;
}

/// Permission check that allows everyone; the default when the host has
/// no policy of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionCheck for AllowAll {
    fn allows(&self, _user_name: &str, _resource: &Resource) -> bool {
        true
    }
}

/// Authorization service for enforcing role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Requires the Admin role.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an Admin.
    pub fn authorize_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Member => Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("Admin"),
            }),
        }
    }

    /// Requires that the actor owns the booking, or is an Admin.
    ///
    /// # Errors
    ///
    /// Returns an error if a member actor is not the booking's owner.
    pub fn authorize_owner(
        actor: &AuthenticatedActor,
        booking: &Booking,
        action: &str,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Member if booking.user_name == actor.user_name => Ok(()),
            Role::Member => Err(AuthError::NotOwner {
                action: action.to_string(),
                booking_id: booking.id,
            }),
        }
    }
}
