//! Connection handles and lifecycle state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::{ConnectionId, OutboundMessage};
use crate::error::RelayError;

/// Lifecycle state of a registered connection.
///
/// `Pending → Identified → Ready`; a connection may close from any state
/// and never moves back from `Ready` to `Identified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Accepted, no identity yet. Invisible to other participants.
    Pending,
    /// Identity bound; receives broadcasts.
    Identified,
    /// Identified and taking part in the audio exchange.
    Ready,
}

/// Cloneable sending side of a transport connection.
///
/// The registry stores one of these per connection. Sending enqueues on a
/// bounded channel drained by the connection's writer task, so it never
/// waits on the network.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<OutboundMessage>,
    created_at: DateTime<Utc>,
}

impl ConnectionHandle {
    /// Wraps an existing outbound queue under a fresh [`ConnectionId`].
    #[must_use]
    pub fn new(outbound: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id: ConnectionId::new(),
            outbound,
            created_at: Utc::now(),
        }
    }

    /// Creates a handle together with the receiving end of its queue.
    ///
    /// A `capacity` of zero is raised to one.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Returns the connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns when the transport accepted the connection.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` once the writer side has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }

    /// Queues a message for delivery without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::TransportSendFailure`] if the queue is full or
    /// the connection's writer has stopped.
    pub fn send(&self, message: OutboundMessage) -> Result<(), RelayError> {
        self.outbound.try_send(message).map_err(|err| {
            let reason = match err {
                TrySendError::Full(_) => "outbound queue full",
                TrySendError::Closed(_) => "connection closed",
            };
            RelayError::TransportSendFailure {
                connection: self.id,
                reason: reason.to_string(),
            }
        })
    }
}
