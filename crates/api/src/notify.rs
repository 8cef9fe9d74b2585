// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Best-effort notification dispatch.
//!
//! Notifications never affect the outcome of the operation that sends
//! them: a dispatch failure is logged and dropped.

use tracing::warn;

/// Outbound notification dispatcher supplied by the host application.
pub trait Notifier {
    /// Delivers one message to one recipient.
    ///
    /// # Errors
    ///
    /// Returns a description of the delivery failure.
    fn dispatch(&mut self, recipient: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Dispatcher that drops every message; the default when the host has
/// no delivery channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn dispatch(&mut self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Sends a notification, logging any failure instead of raising it.
pub fn notify_best_effort(notifier: &mut dyn Notifier, recipient: &str, subject: &str, body: &str) {
    if let Err(e) = notifier.dispatch(recipient, subject, body) {
        warn!(recipient, subject, error = %e, "Notification dispatch failed");
    }
}
