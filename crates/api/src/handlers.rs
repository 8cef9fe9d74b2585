// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for booking operations.
//!
//! Every handler enforces authorization first, translates domain errors
//! into the API taxonomy, and attributes state changes to the actor via
//! audit events. Notifications are best-effort throughout.

use resv::{
    BookingRequest, CheckInOutcome, CheckOutOutcome, select_eligible_booking, validate_check_in,
    validate_check_out, validate_token_check_in,
};
use resv_audit::{Action, AuditEvent, BookingSnapshot, Cause};
use resv_domain::{
    Booking, BookingStatus, Clock, DomainError, RecurrenceRule, WaitlistEntry, parse_slot,
};
use resv_persistence::SqlitePersistence;
use time::Duration;
use tracing::info;

use crate::auth::{AuthenticatedActor, AuthorizationService, PermissionCheck};
use crate::error::{ApiError, translate_domain_error};
use crate::notify::{Notifier, notify_best_effort};
use crate::request_response::{
    BookingInfo, CancelStalePendingResponse, CheckInResponse, CheckOutResponse,
    CreateBookingRequest, CreateBookingResponse, DeleteBookingResponse, UpdateBookingRequest,
    render_instant,
};

/// Evaluates and creates a booking (or series).
///
/// The permission check runs before anything else; a denial is a policy
/// violation, not an authorization error, because it reflects the host's
/// booking policy rather than the actor's role. After creation, one audit
/// event is recorded and one notification dispatched per booking.
///
/// # Errors
///
/// Returns a validation, policy, conflict, or internal error.
pub fn create_booking(
    persistence: &mut SqlitePersistence,
    request: CreateBookingRequest,
    actor: &AuthenticatedActor,
    permissions: &dyn PermissionCheck,
    notifier: &mut dyn Notifier,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<CreateBookingResponse, ApiError> {
    let now = clock.now_utc();

    let resource = persistence.get_resource(request.resource_id)?;
    if !permissions.allows(&actor.user_name, &resource) {
        return Err(ApiError::PolicyViolation {
            rule: String::from("permission"),
            message: format!(
                "user '{}' may not book resource '{}'",
                actor.user_name, resource.name
            ),
        });
    }

    let base_slot = parse_slot(&request.date, &request.start_time, &request.end_time)
        .map_err(translate_domain_error)?;
    let recurrence = request
        .recurrence_rule
        .as_deref()
        .map(RecurrenceRule::parse)
        .transpose()
        .map_err(translate_domain_error)?;

    let booking_request = BookingRequest {
        resource_id: request.resource_id,
        user_name: actor.user_name.clone(),
        title: request.title,
        base_slot,
        recurrence,
    };
    let created = persistence.create_series(&booking_request, now)?;

    // Exactly one audit event and one notification per created booking.
    for booking in &created {
        let event = AuditEvent::new(
            actor.to_audit_actor(),
            cause.clone(),
            Action::new(String::from("CreateBooking"), None),
            None,
            Some(snapshot(booking)?),
        );
        persistence.persist_audit_event(&event, now)?;
        notify_best_effort(
            notifier,
            &booking.user_name,
            "Booking created",
            &format!("'{}' on resource {} is pending", booking.title, booking.resource_id),
        );
    }
    info!(
        count = created.len(),
        resource_id = request.resource_id,
        user_name = %actor.user_name,
        "Created booking series"
    );

    let bookings = created
        .iter()
        .map(BookingInfo::from_booking)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CreateBookingResponse { bookings })
}

/// Changes a booking's time window and/or title.
///
/// Members may only change their own bookings. A time change requires the
/// date and both times together and re-runs conflict detection.
///
/// # Errors
///
/// Returns an authorization, validation, conflict, or internal error.
pub fn update_booking(
    persistence: &mut SqlitePersistence,
    request: UpdateBookingRequest,
    actor: &AuthenticatedActor,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<BookingInfo, ApiError> {
    let now = clock.now_utc();
    let booking = persistence.get_booking(request.booking_id)?;
    AuthorizationService::authorize_owner(actor, &booking, "update_booking")?;

    let time_fields = [
        request.new_date.as_deref(),
        request.new_start_time.as_deref(),
        request.new_end_time.as_deref(),
    ];
    let slot = match time_fields {
        [None, None, None] => booking.slot,
        [Some(date), Some(start), Some(end)] => {
            parse_slot(date, start, end).map_err(translate_domain_error)?
        }
        _ => {
            return Err(ApiError::ValidationError {
                field: String::from("new_date"),
                message: String::from(
                    "a time change requires new_date, new_start_time, and new_end_time together",
                ),
            });
        }
    };
    let title = request.new_title.as_deref().unwrap_or(&booking.title);

    let event = AuditEvent::new(
        actor.to_audit_actor(),
        cause.clone(),
        Action::new(String::from("UpdateBooking"), None),
        Some(snapshot(&booking)?),
        None,
    );
    let updated =
        persistence.update_booking_window(request.booking_id, slot, title, &event, now)?;
    BookingInfo::from_booking(&updated)
}

/// Deletes a booking, promoting the oldest waitlist entry when the
/// deleted booking still held its slot.
///
/// # Errors
///
/// Returns an authorization, not-found, or internal error.
pub fn delete_booking(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    actor: &AuthenticatedActor,
    notifier: &mut dyn Notifier,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<DeleteBookingResponse, ApiError> {
    let now = clock.now_utc();
    let booking = persistence.get_booking(booking_id)?;
    AuthorizationService::authorize_owner(actor, &booking, "delete_booking")?;

    let event = AuditEvent::new(
        actor.to_audit_actor(),
        cause.clone(),
        Action::new(String::from("DeleteBooking"), None),
        Some(snapshot(&booking)?),
        None,
    );
    let (deleted, promoted) = persistence.delete_booking(booking_id, &event, now)?;

    if let Some(entry) = &promoted {
        notify_best_effort(
            notifier,
            &entry.user_name,
            "Slot available",
            &format!(
                "A slot on resource {} has opened up after a booking was removed",
                deleted.resource_id
            ),
        );
    }
    Ok(DeleteBookingResponse {
        promoted_user: promoted.map(|e| e.user_name),
    })
}

/// Approves a pending booking (admin only).
///
/// # Errors
///
/// Returns an authorization or state-transition error.
pub fn approve_booking(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    actor: &AuthenticatedActor,
    notifier: &mut dyn Notifier,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<BookingInfo, ApiError> {
    let (booking, _) = admin_transition(
        persistence,
        booking_id,
        BookingStatus::Approved,
        None,
        actor,
        "approve_booking",
        cause,
        clock,
    )?;
    notify_best_effort(
        notifier,
        &booking.user_name,
        "Booking approved",
        &format!("'{}' has been approved", booking.title),
    );
    BookingInfo::from_booking(&booking)
}

/// Rejects a pending booking (admin only).
///
/// # Errors
///
/// Returns an authorization or state-transition error.
pub fn reject_booking(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    actor: &AuthenticatedActor,
    notifier: &mut dyn Notifier,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<BookingInfo, ApiError> {
    let (booking, promoted) = admin_transition(
        persistence,
        booking_id,
        BookingStatus::Rejected,
        None,
        actor,
        "reject_booking",
        cause,
        clock,
    )?;
    notify_best_effort(
        notifier,
        &booking.user_name,
        "Booking rejected",
        &format!("'{}' has been rejected", booking.title),
    );
    notify_promoted(notifier, promoted.as_ref(), booking.resource_id);
    BookingInfo::from_booking(&booking)
}

/// Cancels a booking on behalf of an admin, storing an optional reason as
/// the admin message. Frees the slot, so the oldest waitlist entry is
/// promoted and notified.
///
/// # Errors
///
/// Returns an authorization or state-transition error.
pub fn cancel_booking_by_admin(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    reason: Option<&str>,
    actor: &AuthenticatedActor,
    notifier: &mut dyn Notifier,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<BookingInfo, ApiError> {
    let (booking, promoted) = admin_transition(
        persistence,
        booking_id,
        BookingStatus::CancelledByAdmin,
        reason,
        actor,
        "cancel_booking_by_admin",
        cause,
        clock,
    )?;
    notify_best_effort(
        notifier,
        &booking.user_name,
        "Booking cancelled",
        reason.unwrap_or("Your booking was cancelled by an administrator"),
    );
    notify_promoted(notifier, promoted.as_ref(), booking.resource_id);
    BookingInfo::from_booking(&booking)
}

/// Acknowledges an admin cancellation: clears the admin message and
/// advances the booking to `cancelled_admin_acknowledged`. Owner-scoped.
///
/// # Errors
///
/// Returns an authorization or state-transition error.
pub fn clear_admin_message(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    actor: &AuthenticatedActor,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<BookingInfo, ApiError> {
    let now = clock.now_utc();
    let booking = persistence.get_booking(booking_id)?;
    AuthorizationService::authorize_owner(actor, &booking, "clear_admin_message")?;
    booking
        .status
        .validate_transition(BookingStatus::CancelledAdminAcknowledged)
        .map_err(translate_domain_error)?;

    let event = AuditEvent::new(
        actor.to_audit_actor(),
        cause.clone(),
        Action::new(String::from("AcknowledgeCancellation"), None),
        Some(snapshot(&booking)?),
        None,
    );
    persistence.acknowledge_cancellation(booking_id, &event, now)?;
    let acknowledged = persistence.get_booking(booking_id)?;
    BookingInfo::from_booking(&acknowledged)
}

/// Checks a booking in by id, optionally verifying a PIN.
///
/// Idempotent: repeating a successful check-in returns the recorded
/// instant without writing anything.
///
/// # Errors
///
/// Returns an authorization or state-transition error.
pub fn check_in(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    actor: &AuthenticatedActor,
    pin: Option<&str>,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<CheckInResponse, ApiError> {
    let now = clock.now_utc();
    let booking = persistence.get_booking(booking_id)?;
    AuthorizationService::authorize_owner(actor, &booking, "check_in")?;

    let settings = persistence.load_settings()?;
    let pins = persistence.active_pins(booking.resource_id)?;
    let outcome = validate_check_in(&booking, &settings, now, pin, &pins)
        .map_err(translate_domain_error)?;

    record_check_in_outcome(persistence, &booking, outcome, actor, cause)
}

/// Checks a booking out by id.
///
/// # Errors
///
/// Returns an authorization or state-transition error.
pub fn check_out(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    actor: &AuthenticatedActor,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<CheckOutResponse, ApiError> {
    let now = clock.now_utc();
    let booking = persistence.get_booking(booking_id)?;
    AuthorizationService::authorize_owner(actor, &booking, "check_out")?;

    let settings = persistence.load_settings()?;
    let outcome =
        validate_check_out(&booking, &settings, now).map_err(translate_domain_error)?;

    match outcome {
        CheckOutOutcome::CheckedOut(at) => {
            let event = AuditEvent::new(
                actor.to_audit_actor(),
                cause.clone(),
                Action::new(String::from("CheckOut"), None),
                Some(snapshot(&booking)?),
                None,
            );
            persistence.record_check_out(booking.id, at, &event)?;
            Ok(CheckOutResponse {
                booking_id: booking.id,
                checked_out_at: render_instant(at)?,
                already_checked_out: false,
            })
        }
        CheckOutOutcome::AlreadyCheckedOut(at) => Ok(CheckOutResponse {
            booking_id: booking.id,
            checked_out_at: render_instant(at)?,
            already_checked_out: true,
        }),
    }
}

/// Checks a booking in by its token (QR path); no login required.
///
/// The token is single-use: it is invalidated on any successful
/// validation, and an expired token is cleared on detection.
///
/// # Errors
///
/// Returns `StateTransitionError` for a missing, expired, or otherwise
/// unusable token.
pub fn check_in_via_token(
    persistence: &mut SqlitePersistence,
    token: &str,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<CheckInResponse, ApiError> {
    let now = clock.now_utc();
    let Some(booking) = persistence.find_booking_by_token(token)? else {
        return Err(translate_domain_error(DomainError::TokenExpiredOrInvalid));
    };

    let settings = persistence.load_settings()?;
    let outcome = match validate_token_check_in(&booking, &settings, now) {
        Ok(outcome) => outcome,
        Err(err) => {
            // An expired token is cleared as soon as it is seen.
            if matches!(err, DomainError::TokenExpiredOrInvalid) {
                persistence.clear_check_in_token(booking.id)?;
            }
            return Err(translate_domain_error(err));
        }
    };

    let actor = AuthenticatedActor::new(
        booking.user_name.clone(),
        crate::auth::Role::Member,
    );
    let response = record_check_in_outcome(persistence, &booking, outcome, &actor, cause)?;
    persistence.clear_check_in_token(booking.id)?;
    Ok(response)
}

/// Checks in via a resource PIN URL: resolves the booking whose check-in
/// window contains "now", preferring the earliest start.
///
/// `user` must be supplied when the settings require login for this path.
///
/// # Errors
///
/// Returns an authorization or state-transition error, including
/// `NoEligibleBooking` when nothing qualifies.
pub fn check_in_via_pin_url(
    persistence: &mut SqlitePersistence,
    resource_id: i64,
    pin: &str,
    user: Option<&str>,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<CheckInResponse, ApiError> {
    let now = clock.now_utc();
    let settings = persistence.load_settings()?;
    if settings.resource_checkin_url_requires_login && user.is_none() {
        return Err(ApiError::Unauthorized {
            action: String::from("check_in_via_pin_url"),
            message: String::from("this resource requires login for PIN check-in"),
        });
    }

    let pins = persistence.active_pins(resource_id)?;
    let candidates = persistence.checkin_candidates(resource_id)?;
    let booking = select_eligible_booking(resource_id, &candidates, &settings, now, user)
        .map_err(translate_domain_error)?
        .clone();

    let outcome = validate_check_in(&booking, &settings, now, Some(pin), &pins)
        .map_err(translate_domain_error)?;

    let actor = AuthenticatedActor::new(
        booking.user_name.clone(),
        crate::auth::Role::Member,
    );
    record_check_in_outcome(persistence, &booking, outcome, &actor, cause)
}

/// Admin-cancels every pending booking whose start passed more than
/// `older_than_hours` ago. Idempotent; meant to be triggered by an
/// external scheduler.
///
/// # Errors
///
/// Returns an authorization or internal error.
pub fn cancel_stale_pending_bookings(
    persistence: &mut SqlitePersistence,
    older_than_hours: i64,
    actor: &AuthenticatedActor,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<CancelStalePendingResponse, ApiError> {
    AuthorizationService::authorize_admin(actor, "cancel_stale_pending_bookings")?;
    let now = clock.now_utc();
    let cutoff = now - Duration::hours(older_than_hours);

    let cancelled = persistence.cancel_stale_pending(cutoff)?;
    if cancelled > 0 {
        let event = AuditEvent::new(
            actor.to_audit_actor(),
            cause.clone(),
            Action::new(
                String::from("CancelStalePendingBookings"),
                Some(format!("cancelled {cancelled} stale pending bookings")),
            ),
            None,
            None,
        );
        persistence.persist_audit_event(&event, now)?;
    }
    info!(cancelled, older_than_hours, "Stale-pending sweep complete");
    Ok(CancelStalePendingResponse { cancelled })
}

/// Fetches one booking.
///
/// # Errors
///
/// Returns a not-found or internal error.
pub fn get_booking(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
) -> Result<BookingInfo, ApiError> {
    let booking = persistence.get_booking(booking_id)?;
    BookingInfo::from_booking(&booking)
}

/// Lists a resource's bookings, earliest start first.
///
/// # Errors
///
/// Returns an internal error if the query fails.
pub fn list_resource_bookings(
    persistence: &mut SqlitePersistence,
    resource_id: i64,
) -> Result<Vec<BookingInfo>, ApiError> {
    persistence
        .bookings_for_resource(resource_id)?
        .iter()
        .map(BookingInfo::from_booking)
        .collect()
}

/// Lists a user's bookings, newest start first.
///
/// # Errors
///
/// Returns an internal error if the query fails.
pub fn list_user_bookings(
    persistence: &mut SqlitePersistence,
    user_name: &str,
) -> Result<Vec<BookingInfo>, ApiError> {
    persistence
        .bookings_for_user(user_name)?
        .iter()
        .map(BookingInfo::from_booking)
        .collect()
}

/// Shared admin status-change path: authorize, validate the transition,
/// apply it with its audit event, and reload.
#[allow(clippy::too_many_arguments)]
fn admin_transition(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    new_status: BookingStatus,
    admin_message: Option<&str>,
    actor: &AuthenticatedActor,
    action: &str,
    cause: &Cause,
    clock: &dyn Clock,
) -> Result<(Booking, Option<WaitlistEntry>), ApiError> {
    AuthorizationService::authorize_admin(actor, action)?;
    let now = clock.now_utc();
    let booking = persistence.get_booking(booking_id)?;
    booking
        .status
        .validate_transition(new_status)
        .map_err(translate_domain_error)?;

    let event = AuditEvent::new(
        actor.to_audit_actor(),
        cause.clone(),
        Action::new(
            action_name(action),
            admin_message.map(str::to_string),
        ),
        Some(snapshot(&booking)?),
        None,
    );
    let promoted =
        persistence.transition_booking(booking_id, new_status, admin_message, &event, now)?;
    let updated = persistence.get_booking(booking_id)?;
    Ok((updated, promoted))
}

fn notify_promoted(
    notifier: &mut dyn Notifier,
    promoted: Option<&WaitlistEntry>,
    resource_id: i64,
) {
    if let Some(entry) = promoted {
        notify_best_effort(
            notifier,
            &entry.user_name,
            "Slot available",
            &format!("A slot on resource {resource_id} has opened up after a booking was removed"),
        );
    }
}

fn action_name(action: &str) -> String {
    match action {
        "approve_booking" => String::from("ApproveBooking"),
        "reject_booking" => String::from("RejectBooking"),
        "cancel_booking_by_admin" => String::from("CancelBooking"),
        other => other.to_string(),
    }
}

fn record_check_in_outcome(
    persistence: &mut SqlitePersistence,
    booking: &Booking,
    outcome: CheckInOutcome,
    actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<CheckInResponse, ApiError> {
    match outcome {
        CheckInOutcome::CheckedIn(at) => {
            let event = AuditEvent::new(
                actor.to_audit_actor(),
                cause.clone(),
                Action::new(String::from("CheckIn"), None),
                Some(snapshot(booking)?),
                None,
            );
            persistence.record_check_in(booking.id, at, &event)?;
            Ok(CheckInResponse {
                booking_id: booking.id,
                checked_in_at: render_instant(at)?,
                already_checked_in: false,
            })
        }
        CheckInOutcome::AlreadyCheckedIn(at) => Ok(CheckInResponse {
            booking_id: booking.id,
            checked_in_at: render_instant(at)?,
            already_checked_in: true,
        }),
    }
}

fn snapshot(booking: &Booking) -> Result<BookingSnapshot, ApiError> {
    Ok(BookingSnapshot::new(
        booking.id,
        booking.resource_id,
        booking.user_name.clone(),
        booking.status,
        format!(
            "{} - {}",
            render_instant(booking.slot.start())?,
            render_instant(booking.slot.end())?
        ),
    ))
}
