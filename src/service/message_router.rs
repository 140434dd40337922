//! Message router: lifecycle events in, deliveries out.
//!
//! Each connection task feeds its transport events into
//! [`MessageRouter::handle_event`]. The router updates the
//! [`ConnectionRegistry`], queues replies, broadcasts and relays, and
//! returns a [`DispatchOutcome`] describing what happened. Nothing here can
//! fail the caller; the worst case is a rejected or ignored request.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::domain::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, ControlMessage, Identity,
    OutboundMessage,
};
use crate::error::RelayError;
use crate::ws::messages::{InboundMessage, SignalMessage};

/// Text sent back for any payload that cannot be understood.
pub const FORMAT_ERROR_MESSAGE: &str = "invalid message format";

/// Transport event for a single connection.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// The transport accepted a new connection.
    Opened(ConnectionHandle),
    /// A text payload arrived.
    Message {
        /// Sending connection.
        connection: ConnectionId,
        /// Raw payload.
        payload: String,
    },
    /// The transport closed the connection.
    Closed(ConnectionId),
    /// The transport failed; the connection is unusable.
    Error {
        /// Failing connection.
        connection: ConnectionId,
        /// Transport-level cause, for logging.
        cause: String,
    },
}

/// What a single event led to.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Connection registered as pending.
    Registered,
    /// Identity bound; confirmation and roster were queued.
    IdentityConfirmed {
        /// Identity now held by the connection.
        identity: Identity,
        /// Number of ready participants sent in the roster.
        roster_size: usize,
    },
    /// Identity refused; an `identity-error` was queued.
    IdentityRejected(RelayError),
    /// Connection became ready and peers were told.
    Joined {
        /// Identity of the new participant.
        identity: Identity,
        /// Peers the notification was queued for.
        notified: usize,
    },
    /// Connection was already ready; nothing sent.
    AlreadyReady,
    /// Audio level fanned out.
    AudioLevelShared {
        /// Peers the sample was queued for.
        notified: usize,
    },
    /// Signal handed to its target.
    Relayed {
        /// Recipient identity.
        target: Identity,
        /// `false` if the recipient's queue refused it.
        delivered: bool,
    },
    /// Signal dropped: no connection holds the target identity.
    TargetMissing(RelayError),
    /// Payload was malformed; a `format-error` was queued.
    FormatRejected(RelayError),
    /// Request not valid in the connection's current state; dropped.
    Ignored(RelayError),
    /// Connection torn down.
    Departed {
        /// Released identity, if the connection had one.
        identity: Option<Identity>,
        /// Peers told about the departure.
        notified: usize,
    },
}

/// Classifies inbound payloads and delivers the resulting messages.
///
/// Stateless apart from the shared [`ConnectionRegistry`]; cheap to clone.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    registry: Arc<ConnectionRegistry>,
}

impl MessageRouter {
    /// Creates a router over `registry`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Single entry point for every connection event.
    pub async fn handle_event(&self, event: ConnectionEvent) -> DispatchOutcome {
        match event {
            ConnectionEvent::Opened(handle) => {
                tracing::info!(connection = %handle.id(), "connection pending identity");
                self.registry.register_pending(handle).await;
                DispatchOutcome::Registered
            }
            ConnectionEvent::Message {
                connection,
                payload,
            } => self.dispatch(connection, &payload).await,
            ConnectionEvent::Closed(connection) => self.teardown(connection).await,
            ConnectionEvent::Error { connection, cause } => {
                tracing::warn!(%connection, %cause, "connection error");
                self.teardown(connection).await
            }
        }
    }

    async fn dispatch(&self, connection: ConnectionId, payload: &str) -> DispatchOutcome {
        self.registry.touch(connection).await;

        let message = match InboundMessage::parse(payload) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(%connection, error = %err, "malformed payload");
                self.reply(
                    connection,
                    ControlMessage::FormatError {
                        message: FORMAT_ERROR_MESSAGE.to_string(),
                    },
                )
                .await;
                return DispatchOutcome::FormatRejected(err);
            }
        };

        tracing::debug!(%connection, kind = message.kind(), "dispatching");
        match message {
            InboundMessage::SetIdentity { identity } => {
                self.set_identity(connection, identity).await
            }
            InboundMessage::Ready => self.ready(connection).await,
            InboundMessage::AudioLevel { level } => self.audio_level(connection, level).await,
            InboundMessage::Signal(signal) => self.relay(connection, signal).await,
        }
    }

    async fn set_identity(&self, connection: ConnectionId, requested: String) -> DispatchOutcome {
        let result = match Identity::parse(requested) {
            Ok(identity) => self
                .registry
                .assign_identity(connection, identity.clone())
                .await
                .map(|roster| (identity, roster)),
            Err(err) => Err(err),
        };

        match result {
            Ok((identity, participants)) => {
                let roster_size = participants.len();
                tracing::info!(%connection, %identity, "identity confirmed");
                DispatchOutcome::IdentityConfirmed {
                    identity,
                    roster_size,
                }
            }
            Err(err @ RelayError::ConnectionNotFound(_)) => DispatchOutcome::Ignored(err),
            Err(err) => {
                tracing::debug!(%connection, error = %err, "identity rejected");
                self.reply(
                    connection,
                    ControlMessage::IdentityError {
                        message: err.to_string(),
                    },
                )
                .await;
                DispatchOutcome::IdentityRejected(err)
            }
        }
    }

    async fn ready(&self, connection: ConnectionId) -> DispatchOutcome {
        match self.registry.mark_ready(connection).await {
            Ok(readiness) if readiness.newly_ready => {
                let identity = readiness.identity;
                let notified = broadcast(
                    &readiness.peers,
                    ControlMessage::ParticipantJoined {
                        identity: identity.clone(),
                    },
                );
                tracing::info!(%connection, %identity, notified, "participant ready");
                DispatchOutcome::Joined { identity, notified }
            }
            Ok(_) => DispatchOutcome::AlreadyReady,
            Err(err) => {
                tracing::debug!(%connection, error = %err, "ready ignored");
                DispatchOutcome::Ignored(err)
            }
        }
    }

    async fn audio_level(&self, connection: ConnectionId, level: Value) -> DispatchOutcome {
        let Some(identity) = self.registry.identity_of(connection).await else {
            tracing::debug!(%connection, "audio level from unidentified connection");
            return DispatchOutcome::Ignored(RelayError::NotIdentified);
        };
        let peers = self.registry.identified_peers(connection).await;
        let notified = broadcast(&peers, ControlMessage::AudioLevel { identity, level });
        DispatchOutcome::AudioLevelShared { notified }
    }

    async fn relay(&self, connection: ConnectionId, signal: SignalMessage) -> DispatchOutcome {
        let Some(sender) = self.registry.identity_of(connection).await else {
            tracing::debug!(%connection, kind = signal.kind(), "signal from unidentified connection");
            return DispatchOutcome::Ignored(RelayError::NotIdentified);
        };

        let Ok(target) = Identity::parse(signal.target()) else {
            return DispatchOutcome::TargetMissing(RelayError::TargetNotFound(
                signal.target().to_string(),
            ));
        };
        let Some(recipient) = self.registry.lookup_by_identity(&target).await else {
            tracing::debug!(%connection, %target, kind = signal.kind(), "signal target not connected");
            return DispatchOutcome::TargetMissing(RelayError::TargetNotFound(target.to_string()));
        };

        let kind = signal.kind().to_string();
        let delivered = match recipient.send(signal.stamp(&sender)) {
            Ok(()) => {
                tracing::debug!(from = %sender, to = %target, %kind, "signal relayed");
                true
            }
            Err(err) => {
                tracing::warn!(from = %sender, to = %target, %kind, error = %err, "signal delivery failed");
                false
            }
        };
        DispatchOutcome::Relayed { target, delivered }
    }

    async fn teardown(&self, connection: ConnectionId) -> DispatchOutcome {
        let Some(departure) = self.registry.remove(connection).await else {
            tracing::debug!(%connection, "connection closed without identity");
            return DispatchOutcome::Departed {
                identity: None,
                notified: 0,
            };
        };

        let identity = departure.identity;
        let notified = broadcast(
            &departure.peers,
            ControlMessage::ParticipantLeft {
                identity: identity.clone(),
            },
        );
        let session_secs = (Utc::now() - departure.connected_since).num_seconds();
        tracing::info!(%connection, %identity, notified, session_secs, "participant left");
        DispatchOutcome::Departed {
            identity: Some(identity),
            notified,
        }
    }

    /// Queues `message` for `connection` itself.
    async fn reply(&self, connection: ConnectionId, message: ControlMessage) {
        let Some(handle) = self.registry.handle_of(connection).await else {
            return;
        };
        let kind = message.kind();
        if let Err(err) = handle.send(message.into()) {
            tracing::warn!(%connection, kind, error = %err, "reply delivery failed");
        }
    }
}

/// Queues `message` for each of `peers`.
///
/// A recipient whose queue refuses the message is skipped; the rest still
/// receive it. Returns the number of successful enqueues.
fn broadcast(peers: &[ConnectionHandle], message: ControlMessage) -> usize {
    let message = OutboundMessage::from(message);
    let mut delivered = 0;
    for peer in peers {
        match peer.send(message.clone()) {
            Ok(()) => delivered += 1,
            Err(err) => {
                tracing::debug!(peer = %peer.id(), kind = message.kind(), error = %err, "broadcast skipped peer");
            }
        }
    }
    delivered
}
