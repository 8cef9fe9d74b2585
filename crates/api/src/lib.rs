// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API layer for the resource booking system.
//!
//! Exposes the booking engine as callable operations: creation with
//! policy and conflict evaluation, owner-scoped editing and deletion,
//! admin lifecycle actions, and the four check-in paths. Authorization is
//! enforced here, errors are translated into the API taxonomy here, and
//! every state change is attributed to its actor via an audit event.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

pub mod auth;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AllowAll, AuthenticatedActor, AuthorizationService, PermissionCheck, Role};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use notify::{Notifier, NullNotifier, notify_best_effort};
