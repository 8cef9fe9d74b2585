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
#![allow(clippy::multiple_crate_versions)]

mod live;

use axum::{
    Json, Router,
    extract::{FromRef, Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use live::{LiveEvent, LiveEventBroadcaster, live_events_handler};
use resv_api::{
    ApiError, AuthenticatedActor, NullNotifier, PermissionCheck, Role, handlers,
    request_response::{
        BookingInfo, CancelStalePendingResponse, CheckInResponse, CheckOutResponse,
        CreateBookingRequest, CreateBookingResponse, DeleteBookingResponse, UpdateBookingRequest,
    },
};
use resv_audit::Cause;
use resv_domain::{Resource, SystemClock};
use resv_persistence::{PersistenceError, SqlitePersistence};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// resv server - HTTP server for the resource booking system
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

/// Application state shared across handlers.
///
/// This contains the persistence layer wrapped in a Mutex to allow
/// safe concurrent access, and the live event broadcaster.
#[derive(Clone)]
struct AppState {
    /// The persistence layer for bookings, settings, and audit events.
    persistence: Arc<Mutex<SqlitePersistence>>,
    /// Fan-out channel for informational booking-change events.
    live: Arc<LiveEventBroadcaster>,
}

impl FromRef<AppState> for Arc<LiveEventBroadcaster> {
    fn from_ref(state: &AppState) -> Self {
        state.live.clone()
    }
}

/// Actor and cause attribution fields carried on every write request.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct Attribution {
    /// The user performing this action.
    actor_id: String,
    /// The role of the actor.
    actor_role: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
}

/// API request for creating a booking or series.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct CreateBookingApiRequest {
    /// Actor and cause attribution.
    #[serde(flatten)]
    attribution: Attribution,
    /// The resource to book.
    resource_id: i64,
    /// The booking date (`YYYY-MM-DD`).
    date: String,
    /// Start of the slot (`HH:MM`).
    start_time: String,
    /// End of the slot (`HH:MM`).
    end_time: String,
    /// Booking title.
    title: String,
    /// Optional recurrence rule (`FREQ=DAILY|WEEKLY;COUNT=n`).
    recurrence_rule: Option<String>,
}

/// API request for editing a booking's window or title.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct UpdateBookingApiRequest {
    /// Actor and cause attribution.
    #[serde(flatten)]
    attribution: Attribution,
    /// The booking to edit.
    booking_id: i64,
    /// New title, if changing.
    new_title: Option<String>,
    /// New date, required together with both times for a time change.
    new_date: Option<String>,
    /// New start time.
    new_start_time: Option<String>,
    /// New end time.
    new_end_time: Option<String>,
}

/// API request for operations addressed to one booking.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct BookingActionRequest {
    /// Actor and cause attribution.
    #[serde(flatten)]
    attribution: Attribution,
    /// The target booking.
    booking_id: i64,
    /// Optional reason (only for admin cancellation).
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    /// Optional PIN (only for check-in on a PIN-protected resource).
    #[serde(skip_serializing_if = "Option::is_none")]
    pin: Option<String>,
}

/// API request for token (QR) check-in. Carries no attribution: the
/// token itself identifies the booking and its owner.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct TokenCheckInRequest {
    /// The single-use check-in token.
    token: String,
}

/// API request for PIN-URL check-in.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct PinUrlCheckInRequest {
    /// The resource being checked into.
    resource_id: i64,
    /// The resource PIN.
    pin: String,
    /// The logged-in user, when the settings require one.
    #[serde(skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
}

/// API request for the stale-pending sweep.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct StalePendingSweepRequest {
    /// Actor and cause attribution.
    #[serde(flatten)]
    attribution: Attribution,
    /// Pending bookings whose start passed more than this many hours ago
    /// are cancelled.
    older_than_hours: i64,
}

/// Query parameters for listing a resource's bookings.
#[derive(Debug, Deserialize)]
struct ResourceBookingsQuery {
    /// The resource.
    resource_id: i64,
}

/// Query parameters for listing a user's bookings.
#[derive(Debug, Deserialize)]
struct UserBookingsQuery {
    /// The user.
    user_name: String,
}

/// Serializable representation of a `Resource` for JSON responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResourceResponse {
    /// The resource id.
    resource_id: i64,
    /// Display name.
    name: String,
    /// Seating/usage capacity.
    capacity: u32,
    /// Whether the resource is under maintenance.
    is_under_maintenance: bool,
    /// Maintenance end, if bounded.
    maintenance_until: Option<String>,
    /// Cap on accepted recurrence counts, if any.
    max_recurrence_count: Option<u32>,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status = match err {
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::PolicyViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict { .. } | ApiError::StateTransitionError { .. } => {
                StatusCode::CONFLICT
            }
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<PersistenceError> for HttpError {
    fn from(err: PersistenceError) -> Self {
        error!(error = %err, "Persistence error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: String::from("a storage error occurred"),
        }
    }
}

/// Converts a `Resource` to a `ResourceResponse`.
fn resource_to_response(resource: &Resource) -> ResourceResponse {
    ResourceResponse {
        resource_id: resource.id,
        name: resource.name.clone(),
        capacity: resource.capacity,
        is_under_maintenance: resource.is_under_maintenance,
        maintenance_until: resource.maintenance_until.map(|at| {
            at.format(&time::format_description::well_known::Iso8601::DEFAULT)
                .unwrap_or_else(|_| String::from("unknown"))
        }),
        max_recurrence_count: resource.max_recurrence_count,
    }
}

/// Parses a role string into a Role enum.
fn parse_role(role_str: &str) -> Result<Role, HttpError> {
    match role_str.to_lowercase().as_str() {
        "admin" => Ok(Role::Admin),
        "member" => Ok(Role::Member),
        _ => Err(HttpError {
            status: StatusCode::BAD_REQUEST,
            message: format!("Invalid role: '{role_str}'. Must be 'admin' or 'member'"),
        }),
    }
}

/// Builds the actor and cause from a request's attribution fields.
fn actor_and_cause(attribution: &Attribution) -> Result<(AuthenticatedActor, Cause), HttpError> {
    let role: Role = parse_role(&attribution.actor_role)?;
    let actor = AuthenticatedActor::new(attribution.actor_id.clone(), role);
    let cause = Cause::new(
        attribution.cause_id.clone(),
        attribution.cause_description.clone(),
    );
    Ok((actor, cause))
}

/// Permission policy for this deployment: every authenticated user may
/// book every resource. Site-specific policies plug in here.
fn permission_policy() -> impl PermissionCheck {
    resv_api::AllowAll
}

/// Handler for POST `/bookings` endpoint.
///
/// Evaluates and creates a booking or recurring series.
async fn handle_create_booking(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreateBookingApiRequest>,
) -> Result<Json<CreateBookingResponse>, HttpError> {
    info!(
        actor_id = %req.attribution.actor_id,
        resource_id = req.resource_id,
        date = %req.date,
        "Handling create_booking request"
    );

    let (actor, cause) = actor_and_cause(&req.attribution)?;
    let request = CreateBookingRequest {
        resource_id: req.resource_id,
        date: req.date,
        start_time: req.start_time,
        end_time: req.end_time,
        title: req.title,
        recurrence_rule: req.recurrence_rule,
    };

    let mut persistence = app_state.persistence.lock().await;
    let response = handlers::create_booking(
        &mut persistence,
        request,
        &actor,
        &permission_policy(),
        &mut NullNotifier,
        &cause,
        &SystemClock,
    )?;
    drop(persistence);

    for booking in &response.bookings {
        app_state.live.broadcast(&LiveEvent::BookingCreated {
            booking_id: booking.booking_id,
            resource_id: booking.resource_id,
            user_name: booking.user_name.clone(),
        });
    }

    Ok(Json(response))
}

/// Handler for POST `/update_booking` endpoint.
async fn handle_update_booking(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<UpdateBookingApiRequest>,
) -> Result<Json<BookingInfo>, HttpError> {
    info!(
        actor_id = %req.attribution.actor_id,
        booking_id = req.booking_id,
        "Handling update_booking request"
    );

    let (actor, cause) = actor_and_cause(&req.attribution)?;
    let request = UpdateBookingRequest {
        booking_id: req.booking_id,
        new_title: req.new_title,
        new_date: req.new_date,
        new_start_time: req.new_start_time,
        new_end_time: req.new_end_time,
    };

    let mut persistence = app_state.persistence.lock().await;
    let updated = handlers::update_booking(&mut persistence, request, &actor, &cause, &SystemClock)?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::BookingUpdated {
        booking_id: updated.booking_id,
        resource_id: updated.resource_id,
    });

    Ok(Json(updated))
}

/// Handler for POST `/delete_booking` endpoint.
async fn handle_delete_booking(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BookingActionRequest>,
) -> Result<Json<DeleteBookingResponse>, HttpError> {
    info!(
        actor_id = %req.attribution.actor_id,
        booking_id = req.booking_id,
        "Handling delete_booking request"
    );

    let (actor, cause) = actor_and_cause(&req.attribution)?;

    let mut persistence = app_state.persistence.lock().await;
    let resource_id = handlers::get_booking(&mut persistence, req.booking_id)?.resource_id;
    let response = handlers::delete_booking(
        &mut persistence,
        req.booking_id,
        &actor,
        &mut NullNotifier,
        &cause,
        &SystemClock,
    )?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::BookingDeleted {
        booking_id: req.booking_id,
        resource_id,
    });
    if let Some(user_name) = &response.promoted_user {
        app_state.live.broadcast(&LiveEvent::WaitlistPromoted {
            resource_id,
            user_name: user_name.clone(),
        });
    }

    Ok(Json(response))
}

/// Handler for POST `/approve_booking` endpoint.
async fn handle_approve_booking(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BookingActionRequest>,
) -> Result<Json<BookingInfo>, HttpError> {
    info!(
        actor_id = %req.attribution.actor_id,
        booking_id = req.booking_id,
        "Handling approve_booking request"
    );

    let (actor, cause) = actor_and_cause(&req.attribution)?;

    let mut persistence = app_state.persistence.lock().await;
    let booking = handlers::approve_booking(
        &mut persistence,
        req.booking_id,
        &actor,
        &mut NullNotifier,
        &cause,
        &SystemClock,
    )?;
    drop(persistence);

    broadcast_status(&app_state, &booking);
    Ok(Json(booking))
}

/// Handler for POST `/reject_booking` endpoint.
async fn handle_reject_booking(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BookingActionRequest>,
) -> Result<Json<BookingInfo>, HttpError> {
    info!(
        actor_id = %req.attribution.actor_id,
        booking_id = req.booking_id,
        "Handling reject_booking request"
    );

    let (actor, cause) = actor_and_cause(&req.attribution)?;

    let mut persistence = app_state.persistence.lock().await;
    let booking = handlers::reject_booking(
        &mut persistence,
        req.booking_id,
        &actor,
        &mut NullNotifier,
        &cause,
        &SystemClock,
    )?;
    drop(persistence);

    broadcast_status(&app_state, &booking);
    Ok(Json(booking))
}

/// Handler for POST `/cancel_booking` endpoint.
///
/// Cancels a booking on behalf of an admin, storing the optional reason
/// as the admin message shown to the owner.
async fn handle_cancel_booking(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BookingActionRequest>,
) -> Result<Json<BookingInfo>, HttpError> {
    info!(
        actor_id = %req.attribution.actor_id,
        booking_id = req.booking_id,
        "Handling cancel_booking request"
    );

    let (actor, cause) = actor_and_cause(&req.attribution)?;

    let mut persistence = app_state.persistence.lock().await;
    let booking = handlers::cancel_booking_by_admin(
        &mut persistence,
        req.booking_id,
        req.reason.as_deref(),
        &actor,
        &mut NullNotifier,
        &cause,
        &SystemClock,
    )?;
    drop(persistence);

    broadcast_status(&app_state, &booking);
    Ok(Json(booking))
}

/// Handler for POST `/clear_admin_message` endpoint.
///
/// Acknowledges an admin cancellation on the owner's behalf.
async fn handle_clear_admin_message(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BookingActionRequest>,
) -> Result<Json<BookingInfo>, HttpError> {
    info!(
        actor_id = %req.attribution.actor_id,
        booking_id = req.booking_id,
        "Handling clear_admin_message request"
    );

    let (actor, cause) = actor_and_cause(&req.attribution)?;

    let mut persistence = app_state.persistence.lock().await;
    let booking = handlers::clear_admin_message(
        &mut persistence,
        req.booking_id,
        &actor,
        &cause,
        &SystemClock,
    )?;
    drop(persistence);

    broadcast_status(&app_state, &booking);
    Ok(Json(booking))
}

/// Handler for POST `/check_in` endpoint.
async fn handle_check_in(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BookingActionRequest>,
) -> Result<Json<CheckInResponse>, HttpError> {
    info!(
        actor_id = %req.attribution.actor_id,
        booking_id = req.booking_id,
        "Handling check_in request"
    );

    let (actor, cause) = actor_and_cause(&req.attribution)?;

    let mut persistence = app_state.persistence.lock().await;
    let resource_id = handlers::get_booking(&mut persistence, req.booking_id)?.resource_id;
    let response = handlers::check_in(
        &mut persistence,
        req.booking_id,
        &actor,
        req.pin.as_deref(),
        &cause,
        &SystemClock,
    )?;
    drop(persistence);

    if !response.already_checked_in {
        app_state.live.broadcast(&LiveEvent::CheckedIn {
            booking_id: response.booking_id,
            resource_id,
        });
    }
    Ok(Json(response))
}

/// Handler for POST `/check_out` endpoint.
async fn handle_check_out(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BookingActionRequest>,
) -> Result<Json<CheckOutResponse>, HttpError> {
    info!(
        actor_id = %req.attribution.actor_id,
        booking_id = req.booking_id,
        "Handling check_out request"
    );

    let (actor, cause) = actor_and_cause(&req.attribution)?;

    let mut persistence = app_state.persistence.lock().await;
    let resource_id = handlers::get_booking(&mut persistence, req.booking_id)?.resource_id;
    let response = handlers::check_out(
        &mut persistence,
        req.booking_id,
        &actor,
        &cause,
        &SystemClock,
    )?;
    drop(persistence);

    if !response.already_checked_out {
        app_state.live.broadcast(&LiveEvent::CheckedOut {
            booking_id: response.booking_id,
            resource_id,
        });
    }
    Ok(Json(response))
}

/// Handler for POST `/check_in_token` endpoint.
///
/// The QR check-in path: no login, the token resolves the booking.
async fn handle_check_in_token(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<TokenCheckInRequest>,
) -> Result<Json<CheckInResponse>, HttpError> {
    info!("Handling check_in_token request");

    let cause = Cause::new(
        String::from("token-check-in"),
        String::from("Check-in via QR token"),
    );

    let mut persistence = app_state.persistence.lock().await;
    let response =
        handlers::check_in_via_token(&mut persistence, &req.token, &cause, &SystemClock)?;
    let resource_id = handlers::get_booking(&mut persistence, response.booking_id)?.resource_id;
    drop(persistence);

    if !response.already_checked_in {
        app_state.live.broadcast(&LiveEvent::CheckedIn {
            booking_id: response.booking_id,
            resource_id,
        });
    }
    Ok(Json(response))
}

/// Handler for POST `/check_in_pin` endpoint.
///
/// The PIN-URL check-in path: resolves the eligible booking for the
/// resource and checks it in.
async fn handle_check_in_pin(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<PinUrlCheckInRequest>,
) -> Result<Json<CheckInResponse>, HttpError> {
    info!(
        resource_id = req.resource_id,
        "Handling check_in_pin request"
    );

    let cause = Cause::new(
        String::from("pin-check-in"),
        String::from("Check-in via resource PIN URL"),
    );

    let mut persistence = app_state.persistence.lock().await;
    let response = handlers::check_in_via_pin_url(
        &mut persistence,
        req.resource_id,
        &req.pin,
        req.user_name.as_deref(),
        &cause,
        &SystemClock,
    )?;
    drop(persistence);

    if !response.already_checked_in {
        app_state.live.broadcast(&LiveEvent::CheckedIn {
            booking_id: response.booking_id,
            resource_id: req.resource_id,
        });
    }
    Ok(Json(response))
}

/// Handler for POST `/cancel_stale_pending` endpoint.
///
/// Admin-cancels pending bookings whose start has long passed. Meant to
/// be invoked by an external scheduler; idempotent.
async fn handle_cancel_stale_pending(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<StalePendingSweepRequest>,
) -> Result<Json<CancelStalePendingResponse>, HttpError> {
    info!(
        actor_id = %req.attribution.actor_id,
        older_than_hours = req.older_than_hours,
        "Handling cancel_stale_pending request"
    );

    let (actor, cause) = actor_and_cause(&req.attribution)?;

    let mut persistence = app_state.persistence.lock().await;
    let response = handlers::cancel_stale_pending_bookings(
        &mut persistence,
        req.older_than_hours,
        &actor,
        &cause,
        &SystemClock,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/bookings/{booking_id}` endpoint.
async fn handle_get_booking(
    AxumState(app_state): AxumState<AppState>,
    Path(booking_id): Path<i64>,
) -> Result<Json<BookingInfo>, HttpError> {
    info!(booking_id, "Handling get_booking request");

    let mut persistence = app_state.persistence.lock().await;
    let booking = handlers::get_booking(&mut persistence, booking_id)?;
    drop(persistence);

    Ok(Json(booking))
}

/// Handler for GET `/resource_bookings` endpoint.
///
/// Lists a resource's bookings, earliest start first.
async fn handle_list_resource_bookings(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ResourceBookingsQuery>,
) -> Result<Json<Vec<BookingInfo>>, HttpError> {
    info!(
        resource_id = query.resource_id,
        "Handling resource_bookings request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let bookings = handlers::list_resource_bookings(&mut persistence, query.resource_id)?;
    drop(persistence);

    Ok(Json(bookings))
}

/// Handler for GET `/user_bookings` endpoint.
///
/// Lists a user's bookings, newest start first.
async fn handle_list_user_bookings(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<UserBookingsQuery>,
) -> Result<Json<Vec<BookingInfo>>, HttpError> {
    info!(user_name = %query.user_name, "Handling user_bookings request");

    let mut persistence = app_state.persistence.lock().await;
    let bookings = handlers::list_user_bookings(&mut persistence, &query.user_name)?;
    drop(persistence);

    Ok(Json(bookings))
}

/// Handler for GET `/resources` endpoint.
async fn handle_list_resources(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<Vec<ResourceResponse>>, HttpError> {
    info!("Handling list_resources request");

    let mut persistence = app_state.persistence.lock().await;
    let resources = persistence.list_resources()?;
    drop(persistence);

    Ok(Json(resources.iter().map(resource_to_response).collect()))
}

/// Broadcasts a status change for a booking.
fn broadcast_status(app_state: &AppState, booking: &BookingInfo) {
    app_state.live.broadcast(&LiveEvent::StatusChanged {
        booking_id: booking.booking_id,
        status: booking.status.clone(),
    });
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/bookings", post(handle_create_booking))
        .route("/bookings/{booking_id}", get(handle_get_booking))
        .route("/resource_bookings", get(handle_list_resource_bookings))
        .route("/user_bookings", get(handle_list_user_bookings))
        .route("/resources", get(handle_list_resources))
        .route("/update_booking", post(handle_update_booking))
        .route("/delete_booking", post(handle_delete_booking))
        .route("/approve_booking", post(handle_approve_booking))
        .route("/reject_booking", post(handle_reject_booking))
        .route("/cancel_booking", post(handle_cancel_booking))
        .route("/clear_admin_message", post(handle_clear_admin_message))
        .route("/check_in", post(handle_check_in))
        .route("/check_out", post(handle_check_out))
        .route("/check_in_token", post(handle_check_in_token))
        .route("/check_in_pin", post(handle_check_in_pin))
        .route("/cancel_stale_pending", post(handle_cancel_stale_pending))
        .route("/live", get(live_events_handler))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing resv server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqlitePersistence::open(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::in_memory()?
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        live: Arc::new(LiveEventBroadcaster::new()),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use tower::ServiceExt;

    /// Helper to create test app state with in-memory persistence and one
    /// seeded resource.
    fn create_test_app_state() -> (AppState, i64) {
        let mut persistence: SqlitePersistence =
            SqlitePersistence::in_memory().expect("Failed to create in-memory persistence");
        let resource_id = persistence
            .insert_resource(&Resource {
                id: 0,
                name: String::from("Conference Room A"),
                capacity: 8,
                is_under_maintenance: false,
                maintenance_until: None,
                max_recurrence_count: Some(10),
            })
            .expect("Failed to seed resource");
        let app_state = AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            live: Arc::new(LiveEventBroadcaster::new()),
        };
        (app_state, resource_id)
    }

    fn attribution(actor_id: &str, role: &str) -> Attribution {
        Attribution {
            actor_id: actor_id.to_string(),
            actor_role: role.to_string(),
            cause_id: String::from("test-cause"),
            cause_description: String::from("Test operation"),
        }
    }

    /// Helper to create a test booking request a year out, so it clears
    /// the past-booking policy whenever the tests run.
    fn create_test_booking_request(
        actor_id: &str,
        role: &str,
        resource_id: i64,
    ) -> CreateBookingApiRequest {
        let next_year = time::OffsetDateTime::now_utc().year() + 1;
        CreateBookingApiRequest {
            attribution: attribution(actor_id, role),
            resource_id,
            date: format!("{next_year}-06-01"),
            start_time: String::from("10:00"),
            end_time: String::from("11:00"),
            title: String::from("Team sync"),
            recurrence_rule: None,
        }
    }

    async fn post_json<T: Serialize>(app: Router, uri: &str, body: &T) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_booking_succeeds() {
        let (app_state, resource_id) = create_test_app_state();
        let app: Router = build_router(app_state);

        let req_body = create_test_booking_request("alice", "member", resource_id);
        let response = post_json(app, "/bookings", &req_body).await;

        assert_eq!(response.status(), HttpStatusCode::OK);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let api_response: CreateBookingResponse = serde_json::from_slice(&body_bytes).unwrap();

        assert_eq!(api_response.bookings.len(), 1);
        assert_eq!(api_response.bookings[0].user_name, "alice");
        assert_eq!(api_response.bookings[0].status, "pending");
    }

    #[tokio::test]
    async fn test_overlapping_booking_conflicts() {
        let (app_state, resource_id) = create_test_app_state();
        let app: Router = build_router(app_state);

        let first = create_test_booking_request("alice", "member", resource_id);
        let response = post_json(app.clone(), "/bookings", &first).await;
        assert_eq!(response.status(), HttpStatusCode::OK);

        let second = create_test_booking_request("bob", "member", resource_id);
        let response = post_json(app, "/bookings", &second).await;
        assert_eq!(response.status(), HttpStatusCode::CONFLICT);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body_bytes).unwrap();
        assert!(error_response.error);
        assert!(error_response.message.contains("waitlist"));
    }

    #[tokio::test]
    async fn test_approve_as_member_fails() {
        let (app_state, resource_id) = create_test_app_state();
        let app: Router = build_router(app_state);

        let create = create_test_booking_request("alice", "member", resource_id);
        let response = post_json(app.clone(), "/bookings", &create).await;
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let created: CreateBookingResponse = serde_json::from_slice(&body_bytes).unwrap();
        let booking_id = created.bookings[0].booking_id;

        let req_body = BookingActionRequest {
            attribution: attribution("alice", "member"),
            booking_id,
            reason: None,
            pin: None,
        };
        let response = post_json(app, "/approve_booking", &req_body).await;
        assert_eq!(response.status(), HttpStatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_approve_as_admin_succeeds() {
        let (app_state, resource_id) = create_test_app_state();
        let app: Router = build_router(app_state);

        let create = create_test_booking_request("alice", "member", resource_id);
        let response = post_json(app.clone(), "/bookings", &create).await;
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let created: CreateBookingResponse = serde_json::from_slice(&body_bytes).unwrap();
        let booking_id = created.bookings[0].booking_id;

        let req_body = BookingActionRequest {
            attribution: attribution("root", "admin"),
            booking_id,
            reason: None,
            pin: None,
        };
        let response = post_json(app, "/approve_booking", &req_body).await;
        assert_eq!(response.status(), HttpStatusCode::OK);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let booking: BookingInfo = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(booking.status, "approved");
    }

    #[tokio::test]
    async fn test_invalid_role_returns_bad_request() {
        let (app_state, resource_id) = create_test_app_state();
        let app: Router = build_router(app_state);

        let req_body = create_test_booking_request("alice", "superuser", resource_id);
        let response = post_json(app, "/bookings", &req_body).await;
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_missing_booking_returns_not_found() {
        let (app_state, _resource_id) = create_test_app_state();
        let app: Router = build_router(app_state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/bookings/404")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_resources() {
        let (app_state, _resource_id) = create_test_app_state();
        let app: Router = build_router(app_state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/resources")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::OK);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let resources: Vec<ResourceResponse> = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, "Conference Room A");
    }

    #[tokio::test]
    async fn test_live_events_reflect_creation() {
        let (app_state, resource_id) = create_test_app_state();
        let app: Router = build_router(app_state.clone());

        let mut rx = app_state.live.subscribe();

        let req_body = create_test_booking_request("alice", "member", resource_id);
        let response = post_json(app, "/bookings", &req_body).await;
        assert_eq!(response.status(), HttpStatusCode::OK);

        match rx.try_recv() {
            Ok(LiveEvent::BookingCreated { user_name, .. }) => {
                assert_eq!(user_name, "alice");
            }
            other => panic!("Expected BookingCreated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stale_sweep_requires_admin() {
        let (app_state, _resource_id) = create_test_app_state();
        let app: Router = build_router(app_state);

        let req_body = StalePendingSweepRequest {
            attribution: attribution("alice", "member"),
            older_than_hours: 24,
        };
        let response = post_json(app, "/cancel_stale_pending", &req_body).await;
        assert_eq!(response.status(), HttpStatusCode::FORBIDDEN);
    }
}
