// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live booking-change streaming for calendar UIs.
//!
//! Connected WebSocket clients receive a read-only feed of booking
//! changes. Every event is an after-the-fact statement about something
//! that already happened in the store; nothing streamed here is
//! authoritative, and no commands are accepted over the socket. Clients
//! that need the current truth query the HTTP endpoints.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Broadcast channel capacity. Slow clients that fall this far behind
/// lose the oldest events.
const EVENT_BUFFER_SIZE: usize = 100;

/// Booking-change events pushed to live subscribers.
///
/// Derived from successful operations after they commit; purely
/// informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// A booking (or series of bookings) was created.
    BookingCreated {
        /// The booking id.
        booking_id: i64,
        /// The booked resource.
        resource_id: i64,
        /// The owning user.
        user_name: String,
    },
    /// A booking's time window or title changed.
    BookingUpdated {
        /// The booking id.
        booking_id: i64,
        /// The booked resource.
        resource_id: i64,
    },
    /// A booking was deleted.
    BookingDeleted {
        /// The booking id.
        booking_id: i64,
        /// The resource it reserved.
        resource_id: i64,
    },
    /// A booking's lifecycle status changed (approved, rejected, or
    /// admin-cancelled).
    StatusChanged {
        /// The booking id.
        booking_id: i64,
        /// The new status, snake_case.
        status: String,
    },
    /// A booking was checked in.
    CheckedIn {
        /// The booking id.
        booking_id: i64,
        /// The booked resource.
        resource_id: i64,
    },
    /// A booking was checked out.
    CheckedOut {
        /// The booking id.
        booking_id: i64,
        /// The booked resource.
        resource_id: i64,
    },
    /// A waitlist entry was promoted after a slot opened up.
    WaitlistPromoted {
        /// The resource whose slot opened.
        resource_id: i64,
        /// The promoted user.
        user_name: String,
    },
    /// Connection confirmation (sent on initial connect).
    Connected {
        /// Server timestamp (ISO 8601).
        timestamp: String,
    },
}

/// Fan-out point for live booking events, wrapping a
/// `tokio::sync::broadcast` channel.
#[derive(Clone)]
pub struct LiveEventBroadcaster {
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveEventBroadcaster {
    /// Creates a new event broadcaster.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Sends an event to every connected client without blocking. With no
    /// clients connected the event is dropped.
    pub fn broadcast(&self, event: &LiveEvent) {
        match self.tx.send(event.clone()) {
            Ok(count) => {
                debug!(?event, receivers = count, "Broadcast live event");
            }
            Err(_) => {
                debug!(?event, "No receivers for live event");
            }
        }
    }

    /// Subscribes to the stream. Only events sent after subscription are
    /// delivered.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Upgrades an HTTP request to a WebSocket subscribed to the live feed.
pub async fn live_events_handler(
    ws: WebSocketUpgrade,
    AxumState(broadcaster): AxumState<Arc<LiveEventBroadcaster>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

/// Drives one WebSocket connection: confirms the connection, then relays
/// broadcast events until the client goes away.
async fn handle_socket(socket: WebSocket, broadcaster: Arc<LiveEventBroadcaster>) {
    info!("Client connected to live event stream");

    let (mut sender, mut receiver) = socket.split();
    let mut rx: broadcast::Receiver<LiveEvent> = broadcaster.subscribe();

    let connected_event = LiveEvent::Connected {
        timestamp: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Iso8601::DEFAULT)
            .unwrap_or_else(|_| String::from("unknown")),
    };

    if let Ok(json) = serde_json::to_string(&connected_event)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to send connection confirmation");
        return;
    }

    // Relay broadcast events to this client until it disconnects.
    let mut send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(?e, "Failed to serialize live event");
                }
            }
        }
    });

    // The feed is one-way; inbound frames are drained and dropped so
    // close frames and errors are still observed.
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    info!("Client disconnected from live event stream");
}
