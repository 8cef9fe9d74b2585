// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the resource booking system.
//!
//! This crate owns the `SQLite` database: schema migrations, row models,
//! range-overlap queries, and the booking transaction manager. It is built
//! on Diesel.
//!
//! ## Serialization of check-then-act
//!
//! Booking creation is a check-then-act sequence (evaluate the schedule,
//! then insert). [`SqlitePersistence::create_series`] assembles the
//! schedule snapshot and inserts the series inside a single
//! `immediate_transaction`, so `SQLite`'s write lock serializes concurrent
//! requests for the same resource and a double-booking cannot slip between
//! the check and the insert.
//!
//! ## Two-phase series creation
//!
//! Phase one inserts every occurrence row in one transaction; any failure
//! rolls the entire series back. Phase two mints check-in tokens in a
//! second transaction and only fills rows whose token is still NULL, so it
//! is idempotent and a failed minting run can be retried without
//! disturbing already-issued tokens.
//!
//! ## Testing
//!
//! Tests run against in-memory `SQLite` databases; each test gets a fresh
//! connection with migrations applied.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use resv::{
    BookingRequest, Rejection, ResourceSchedule, WaitlistDecision, evaluate_booking_request,
};
use resv_audit::AuditEvent;
use resv_domain::{
    Booking, BookingSettings, BookingStatus, Resource, ResourcePin, TimeSlot, WaitlistEntry,
    format_instant,
};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

pub mod data_models;
pub mod diesel_schema;
pub mod error;
pub mod mutations;
pub mod queries;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;
pub use mutations::series::{TOKEN_LENGTH, TOKEN_VALIDITY_HOURS};

/// Embedded `SQLite` migrations, applied on open.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// What a committed series-creation transaction decided.
enum SeriesOutcome {
    Created(Vec<i64>),
    Rejected(Rejection),
}

/// The `SQLite`-backed store.
///
/// Owns a single connection; callers that need concurrent access wrap it
/// in a mutex and the `immediate_transaction` write lock does the rest.
pub struct SqlitePersistence {
    conn: SqliteConnection,
}

impl SqlitePersistence {
    /// Opens (and if necessary creates) the database at `database_url` and
    /// brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub fn open(database_url: &str) -> Result<Self, PersistenceError> {
        info!(database_url, "Opening SQLite database");
        let mut conn = SqliteConnection::establish(database_url)?;

        // PRAGMA is raw SQL; Diesel has no PRAGMA DSL.
        conn.batch_execute("PRAGMA foreign_keys = ON")
            .map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;

        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Opens a fresh in-memory database with migrations applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub fn in_memory() -> Result<Self, PersistenceError> {
        Self::open(":memory:")
    }

    // ---- booking transaction manager ----

    /// Evaluates and, if clean, atomically persists a booking series.
    ///
    /// The schedule snapshot is assembled and evaluated inside the same
    /// `immediate_transaction` that inserts the occurrence rows. On a
    /// same-resource conflict the waitlist enrollment (when the decision is
    /// `Enroll`) is committed even though the request itself fails.
    ///
    /// After commit, check-in tokens are minted in a second, idempotent
    /// transaction; a minting failure is logged and left for
    /// [`Self::mint_missing_tokens`] to repair.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Rejected` when the engine turns the
    /// request down, or a database error.
    pub fn create_series(
        &mut self,
        request: &BookingRequest,
        now: OffsetDateTime,
    ) -> Result<Vec<Booking>, PersistenceError> {
        let outcome = self
            .conn
            .immediate_transaction::<_, PersistenceError, _>(|conn| {
                let schedule = assemble_schedule(conn, request, now)?;

                match evaluate_booking_request(request, &schedule, now) {
                    Ok(series) => {
                        let ids = mutations::series::insert_series(
                            conn,
                            request.resource_id,
                            &request.user_name,
                            &request.title,
                            &series.occurrences,
                            series.recurrence_rule.as_deref(),
                        )?;
                        Ok(SeriesOutcome::Created(ids))
                    }
                    Err(rejection) => {
                        if rejection.waitlist == Some(WaitlistDecision::Enroll) {
                            let created_at = stored_instant(now)?;
                            if let Err(e) = mutations::waitlist::enroll(
                                conn,
                                request.resource_id,
                                &request.user_name,
                                &created_at,
                            ) {
                                warn!(
                                    resource_id = request.resource_id,
                                    user_name = %request.user_name,
                                    error = %e,
                                    "Waitlist enrollment failed"
                                );
                            }
                        }
                        Ok(SeriesOutcome::Rejected(rejection))
                    }
                }
            })?;

        let ids = match outcome {
            SeriesOutcome::Created(ids) => ids,
            SeriesOutcome::Rejected(rejection) => return Err(rejection.into()),
        };

        if let Err(e) = self.mint_missing_tokens(&ids) {
            warn!(error = %e, "Token minting failed; series is committed and minting can be retried");
        }

        ids.into_iter()
            .map(|id| queries::bookings::get_booking(&mut self.conn, id))
            .collect()
    }

    /// Mints check-in tokens for any of the given bookings that still lack
    /// one. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if the database transaction fails.
    pub fn mint_missing_tokens(&mut self, booking_ids: &[i64]) -> Result<(), PersistenceError> {
        self.conn
            .transaction::<_, PersistenceError, _>(|conn| {
                mutations::series::mint_check_in_tokens(conn, booking_ids)
            })
    }

    /// Rewrites a booking's window and title after re-running conflict
    /// detection against the resource's other active bookings.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Rejected` on a slot conflict, or a
    /// database error.
    pub fn update_booking_window(
        &mut self,
        booking_id: i64,
        slot: TimeSlot,
        title: &str,
        event: &AuditEvent,
        now: OffsetDateTime,
    ) -> Result<Booking, PersistenceError> {
        self.conn
            .immediate_transaction::<_, PersistenceError, _>(|conn| {
                let booking = queries::bookings::get_booking(conn, booking_id)?;
                let (start, end) = (stored_instant(slot.start())?, stored_instant(slot.end())?);

                let others: Vec<Booking> = queries::bookings::active_bookings_overlapping(
                    conn,
                    booking.resource_id,
                    &start,
                    &end,
                )?
                .into_iter()
                .filter(|b| b.id != booking_id)
                .collect();

                if let Some(hit) = resv::find_overlapping(&slot, &others) {
                    let rejection = Rejection {
                        error: resv::CoreError::Conflict(resv::ConflictError::SlotConflict {
                            booking_id: hit.id,
                            user_name: hit.user_name.clone(),
                            start: hit.slot.start(),
                            end: hit.slot.end(),
                        }),
                        waitlist: None,
                    };
                    return Err(rejection.into());
                }

                mutations::bookings::update_booking_window(conn, booking_id, &start, &end, title)?;
                mutations::audit::insert_event(conn, event, now)?;
                queries::bookings::get_booking(conn, booking_id)
            })
    }

    /// Deletes a booking and, when it was still active, pops the oldest
    /// waitlist entry for its resource so the caller can notify that user.
    ///
    /// # Errors
    ///
    /// Returns an error if the booking does not exist or the transaction
    /// fails.
    pub fn delete_booking(
        &mut self,
        booking_id: i64,
        event: &AuditEvent,
        now: OffsetDateTime,
    ) -> Result<(Booking, Option<WaitlistEntry>), PersistenceError> {
        self.conn
            .immediate_transaction::<_, PersistenceError, _>(|conn| {
                let booking = queries::bookings::get_booking(conn, booking_id)?;
                mutations::bookings::delete_booking(conn, booking_id)?;
                mutations::audit::insert_event(conn, event, now)?;

                let promoted = if booking.status.is_active() {
                    mutations::waitlist::pop_oldest(conn, booking.resource_id)?
                } else {
                    None
                };
                debug!(booking_id, promoted = promoted.is_some(), "Deleted booking");
                Ok((booking, promoted))
            })
    }

    /// Sets a booking's status (and optionally an admin message) and
    /// records the audit event in the same transaction. Transition
    /// validity has already been checked.
    ///
    /// When the new status is terminal for an active slot (an admin
    /// cancellation), the oldest waitlist entry for the resource is popped
    /// and returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn transition_booking(
        &mut self,
        booking_id: i64,
        status: BookingStatus,
        admin_message: Option<&str>,
        event: &AuditEvent,
        now: OffsetDateTime,
    ) -> Result<Option<WaitlistEntry>, PersistenceError> {
        self.conn
            .immediate_transaction::<_, PersistenceError, _>(|conn| {
                let booking = queries::bookings::get_booking(conn, booking_id)?;
                mutations::bookings::update_status(conn, booking_id, status)?;
                if let Some(message) = admin_message {
                    mutations::bookings::set_admin_message(conn, booking_id, Some(message))?;
                }
                mutations::audit::insert_event(conn, event, now)?;

                let freed_slot = booking.status.is_active() && !status.is_active();
                if freed_slot {
                    return mutations::waitlist::pop_oldest(conn, booking.resource_id);
                }
                Ok(None)
            })
    }

    /// Acknowledges an admin cancellation: advances the status to
    /// `cancelled_admin_acknowledged` and clears the admin message, in one
    /// transaction with its audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn acknowledge_cancellation(
        &mut self,
        booking_id: i64,
        event: &AuditEvent,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        self.conn
            .immediate_transaction::<_, PersistenceError, _>(|conn| {
                mutations::bookings::update_status(
                    conn,
                    booking_id,
                    BookingStatus::CancelledAdminAcknowledged,
                )?;
                mutations::bookings::set_admin_message(conn, booking_id, None)?;
                mutations::audit::insert_event(conn, event, now)
            })
    }

    /// Records a check-in and its audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn record_check_in(
        &mut self,
        booking_id: i64,
        checked_in_at: OffsetDateTime,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn
            .immediate_transaction::<_, PersistenceError, _>(|conn| {
                let at = stored_instant(checked_in_at)?;
                mutations::bookings::record_check_in(conn, booking_id, &at)?;
                mutations::audit::insert_event(conn, event, checked_in_at)
            })
    }

    /// Records a check-out and its audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn record_check_out(
        &mut self,
        booking_id: i64,
        checked_out_at: OffsetDateTime,
        event: &AuditEvent,
    ) -> Result<(), PersistenceError> {
        self.conn
            .immediate_transaction::<_, PersistenceError, _>(|conn| {
                let at = stored_instant(checked_out_at)?;
                mutations::bookings::record_check_out(conn, booking_id, &at)?;
                mutations::audit::insert_event(conn, event, checked_out_at)
            })
    }

    /// Invalidates a booking's check-in token.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn clear_check_in_token(&mut self, booking_id: i64) -> Result<(), PersistenceError> {
        mutations::bookings::clear_check_in_token(&mut self.conn, booking_id)
    }

    /// Admin-cancels every pending booking whose start precedes `cutoff`.
    /// Returns the number of bookings cancelled. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn cancel_stale_pending(
        &mut self,
        cutoff: OffsetDateTime,
    ) -> Result<usize, PersistenceError> {
        let cutoff = stored_instant(cutoff)?;
        self.conn
            .immediate_transaction::<_, PersistenceError, _>(|conn| {
                mutations::bookings::cancel_stale_pending(conn, &cutoff)
            })
    }

    // ---- reads ----

    /// Fetches a booking by id.
    ///
    /// # Errors
    ///
    /// Returns `BookingNotFound` when no such row exists.
    pub fn get_booking(&mut self, booking_id: i64) -> Result<Booking, PersistenceError> {
        queries::bookings::get_booking(&mut self.conn, booking_id)
    }

    /// Fetches a resource by id.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when no such row exists.
    pub fn get_resource(&mut self, resource_id: i64) -> Result<Resource, PersistenceError> {
        queries::bookings::get_resource(&mut self.conn, resource_id)
    }

    /// All resources, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_resources(&mut self) -> Result<Vec<Resource>, PersistenceError> {
        queries::bookings::list_resources(&mut self.conn)
    }

    /// All bookings for a user, newest start first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn bookings_for_user(&mut self, user_name: &str) -> Result<Vec<Booking>, PersistenceError> {
        queries::bookings::bookings_for_user(&mut self.conn, user_name)
    }

    /// All bookings on a resource, earliest start first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn bookings_for_resource(
        &mut self,
        resource_id: i64,
    ) -> Result<Vec<Booking>, PersistenceError> {
        queries::bookings::bookings_for_resource(&mut self.conn, resource_id)
    }

    /// Looks up a booking by check-in token.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_booking_by_token(
        &mut self,
        token: &str,
    ) -> Result<Option<Booking>, PersistenceError> {
        queries::bookings::find_booking_by_token(&mut self.conn, token)
    }

    /// Bookings on a resource eligible for anonymous PIN check-in.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn checkin_candidates(
        &mut self,
        resource_id: i64,
    ) -> Result<Vec<Booking>, PersistenceError> {
        queries::bookings::checkin_candidates_for_resource(&mut self.conn, resource_id)
    }

    /// Active PINs for a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn active_pins(&mut self, resource_id: i64) -> Result<Vec<ResourcePin>, PersistenceError> {
        queries::pins::active_pins_for_resource(&mut self.conn, resource_id)
    }

    /// The waitlist for a resource in FIFO order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn waitlist(&mut self, resource_id: i64) -> Result<Vec<WaitlistEntry>, PersistenceError> {
        queries::waitlist::waitlist_for_resource(&mut self.conn, resource_id)
    }

    /// Loads the booking settings (or defaults).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn load_settings(&mut self) -> Result<BookingSettings, PersistenceError> {
        queries::settings::load_settings(&mut self.conn)
    }

    // ---- setup writes ----

    /// Inserts a resource, returning its new id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_resource(&mut self, resource: &Resource) -> Result<i64, PersistenceError> {
        mutations::bootstrap::insert_resource(&mut self.conn, resource)
    }

    /// Updates a resource's maintenance state.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn set_maintenance(
        &mut self,
        resource_id: i64,
        under_maintenance: bool,
        until: Option<OffsetDateTime>,
    ) -> Result<(), PersistenceError> {
        let until = until.map(stored_instant).transpose()?;
        mutations::bootstrap::set_maintenance(
            &mut self.conn,
            resource_id,
            under_maintenance,
            until.as_deref(),
        )
    }

    /// Writes the settings singleton.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_settings(&mut self, settings: &BookingSettings) -> Result<(), PersistenceError> {
        mutations::bootstrap::save_settings(&mut self.conn, settings)
    }

    /// Registers a PIN for a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_pin(
        &mut self,
        resource_id: i64,
        pin: &str,
        is_active: bool,
    ) -> Result<(), PersistenceError> {
        mutations::bootstrap::insert_pin(&mut self.conn, resource_id, pin, is_active)
    }

    #[cfg(test)]
    pub(crate) fn conn_mut(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    /// Appends an audit event outside any other write.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn persist_audit_event(
        &mut self,
        event: &AuditEvent,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::audit::insert_event(&mut self.conn, event, now)
    }
}

/// Builds the schedule snapshot for one request. Must run inside the same
/// transaction as the subsequent insert.
fn assemble_schedule(
    conn: &mut SqliteConnection,
    request: &BookingRequest,
    now: OffsetDateTime,
) -> Result<ResourceSchedule, PersistenceError> {
    let resource = queries::bookings::get_resource(conn, request.resource_id)?;
    let settings = queries::settings::load_settings(conn)?;
    let now_stored = stored_instant(now)?;

    // The candidate occurrences bound the window the snapshot must cover.
    let occurrences = resv_domain::expand(request.recurrence.as_ref(), request.base_slot);
    let window_start = occurrences
        .iter()
        .map(TimeSlot::start)
        .min()
        .unwrap_or_else(|| request.base_slot.start());
    let window_end = occurrences
        .iter()
        .map(TimeSlot::end)
        .max()
        .unwrap_or_else(|| request.base_slot.end());
    let (window_start, window_end) = (stored_instant(window_start)?, stored_instant(window_end)?);

    let resource_bookings = queries::bookings::active_bookings_overlapping(
        conn,
        request.resource_id,
        &window_start,
        &window_end,
    )?;
    let user_other_bookings = queries::bookings::user_bookings_elsewhere_overlapping(
        conn,
        &request.user_name,
        request.resource_id,
        &window_start,
        &window_end,
    )?;
    let user_active_count =
        queries::bookings::user_active_booking_count(conn, &request.user_name, &now_stored)?;
    let waitlist_len = queries::waitlist::waitlist_len(conn, request.resource_id)?;
    let user_on_waitlist =
        queries::waitlist::is_on_waitlist(conn, request.resource_id, &request.user_name)?;

    let waitlist_cap = settings.waitlist_cap;
    Ok(ResourceSchedule {
        resource,
        settings,
        resource_bookings,
        user_other_bookings,
        user_active_count,
        waitlist_len,
        waitlist_cap,
        user_on_waitlist,
    })
}

fn stored_instant(instant: OffsetDateTime) -> Result<String, PersistenceError> {
    format_instant(instant).map_err(|e| PersistenceError::SerializationError(e.to_string()))
}
