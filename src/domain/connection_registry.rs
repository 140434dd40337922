//! Authoritative store of live connections and their identities.
//!
//! [`ConnectionRegistry`] keeps every accepted connection together with its
//! lifecycle state, the identity index used for unicast routing and the
//! ordered roster of ready participants.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::{ConnectionHandle, ConnectionId, ConnectionState, ControlMessage, Identity};
use crate::error::RelayError;

/// Result of a successful [`ConnectionRegistry::mark_ready`].
#[derive(Debug, Clone)]
pub struct Readiness {
    /// Identity of the connection that is now ready.
    pub identity: Identity,
    /// `false` when the connection was already ready before this call.
    pub newly_ready: bool,
    /// Identified peers at the moment the connection became ready, sender
    /// excluded. Empty unless `newly_ready`.
    pub peers: Vec<ConnectionHandle>,
}

/// Result of [`ConnectionRegistry::remove`] for a connection that held an
/// identity.
#[derive(Debug, Clone)]
pub struct Departure {
    /// Released identity.
    pub identity: Identity,
    /// Identified peers left behind, snapshotted with the removal.
    pub peers: Vec<ConnectionHandle>,
    /// When the transport accepted the departed connection.
    pub connected_since: DateTime<Utc>,
}

/// Connection counts per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Connections that have not chosen an identity yet.
    pub pending: usize,
    /// Connections with a bound identity, ready ones included.
    pub identified: usize,
    /// Connections that signalled readiness.
    pub ready: usize,
}

#[derive(Debug, Clone)]
enum Presence {
    Pending,
    Identified(Identity),
    Ready { identity: Identity, seq: u64 },
}

impl Presence {
    fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Pending => None,
            Self::Identified(identity) | Self::Ready { identity, .. } => Some(identity),
        }
    }

    const fn state(&self) -> ConnectionState {
        match self {
            Self::Pending => ConnectionState::Pending,
            Self::Identified(_) => ConnectionState::Identified,
            Self::Ready { .. } => ConnectionState::Ready,
        }
    }
}

#[derive(Debug)]
struct ConnectionEntry {
    handle: ConnectionHandle,
    presence: Presence,
    last_activity: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    identities: HashMap<Identity, ConnectionId>,
    /// Ready connections keyed by the order in which they became ready.
    ready: BTreeMap<u64, ConnectionId>,
    next_ready_seq: u64,
}

impl RegistryState {
    fn roster(&self) -> Vec<Identity> {
        self.ready
            .values()
            .filter_map(|id| self.connections.get(id))
            .filter_map(|entry| entry.presence.identity().cloned())
            .collect()
    }

    fn peers(&self, except: ConnectionId) -> Vec<ConnectionHandle> {
        self.identities
            .values()
            .filter(|id| **id != except)
            .filter_map(|id| self.connections.get(id))
            .map(|entry| entry.handle.clone())
            .collect()
    }
}

/// Queues a control message, logging instead of failing.
fn notify(handle: &ConnectionHandle, message: ControlMessage) {
    let kind = message.kind();
    if let Err(err) = handle.send(message.into()) {
        tracing::warn!(connection = %handle.id(), kind, error = %err, "notification dropped");
    }
}

/// Central store for all live connections.
///
/// # Concurrency
///
/// All state lives behind a single [`RwLock`]. Every mutating operation
/// performs its check and its update under one write guard, so two
/// connections racing for the same identity can never both win. Recipients
/// of the resulting notifications are taken under that same guard, and the
/// confirmation of a new identity is queued before it is released: a peer
/// can never see a `participant-joined` ahead of its own
/// `identity-confirmed`, nor a participant that its roster already listed.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a freshly accepted connection in the `Pending` state.
    pub async fn register_pending(&self, handle: ConnectionHandle) {
        let now = Utc::now();
        let mut state = self.state.write().await;
        state
            .connections
            .entry(handle.id())
            .or_insert_with(|| ConnectionEntry {
                handle,
                presence: Presence::Pending,
                last_activity: now,
            });
    }

    /// Binds `identity` to a pending connection.
    ///
    /// On success the connection becomes `Identified`, `identity-confirmed`
    /// followed by `participant-list` is queued on its handle, and the
    /// roster sent is returned (ready participants in join order).
    ///
    /// # Errors
    ///
    /// - [`RelayError::ConnectionNotFound`] if the connection is unknown.
    /// - [`RelayError::AlreadyIdentified`] if it already has an identity.
    /// - [`RelayError::IdentityTaken`] if another connection holds `identity`.
    pub async fn assign_identity(
        &self,
        connection: ConnectionId,
        identity: Identity,
    ) -> Result<Vec<Identity>, RelayError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let entry = state
            .connections
            .get_mut(&connection)
            .ok_or(RelayError::ConnectionNotFound(connection))?;
        if !matches!(entry.presence, Presence::Pending) {
            return Err(RelayError::AlreadyIdentified);
        }
        if state.identities.contains_key(&identity) {
            return Err(RelayError::IdentityTaken(identity.to_string()));
        }

        entry.presence = Presence::Identified(identity.clone());
        let handle = entry.handle.clone();
        state.identities.insert(identity, connection);

        let roster = state.roster();
        notify(&handle, ControlMessage::IdentityConfirmed);
        notify(
            &handle,
            ControlMessage::ParticipantList {
                participants: roster.clone(),
            },
        );
        Ok(roster)
    }

    /// Adds an identified connection to the ready roster.
    ///
    /// Calling it on a connection that is already ready is a no-op reported
    /// through [`Readiness::newly_ready`].
    ///
    /// # Errors
    ///
    /// - [`RelayError::ConnectionNotFound`] if the connection is unknown.
    /// - [`RelayError::NotIdentified`] if it has no identity yet.
    pub async fn mark_ready(&self, connection: ConnectionId) -> Result<Readiness, RelayError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let entry = state
            .connections
            .get_mut(&connection)
            .ok_or(RelayError::ConnectionNotFound(connection))?;
        match &entry.presence {
            Presence::Pending => Err(RelayError::NotIdentified),
            Presence::Ready { identity, .. } => Ok(Readiness {
                identity: identity.clone(),
                newly_ready: false,
                peers: Vec::new(),
            }),
            Presence::Identified(identity) => {
                let identity = identity.clone();
                let seq = state.next_ready_seq;
                state.next_ready_seq = seq.saturating_add(1);
                entry.presence = Presence::Ready {
                    identity: identity.clone(),
                    seq,
                };
                state.ready.insert(seq, connection);
                Ok(Readiness {
                    identity,
                    newly_ready: true,
                    peers: state.peers(connection),
                })
            }
        }
    }

    /// Returns the handle of the connection holding `identity`.
    pub async fn lookup_by_identity(&self, identity: &Identity) -> Option<ConnectionHandle> {
        let state = self.state.read().await;
        state
            .identities
            .get(identity)
            .and_then(|id| state.connections.get(id))
            .map(|entry| entry.handle.clone())
    }

    /// Tears down all state for `connection` and releases its identity.
    ///
    /// Returns the released identity with the peers to tell, if one was
    /// bound. A second call for the same connection returns `None`.
    pub async fn remove(&self, connection: ConnectionId) -> Option<Departure> {
        let mut state = self.state.write().await;
        let entry = state.connections.remove(&connection)?;
        let identity = match entry.presence {
            Presence::Pending => return None,
            Presence::Identified(identity) => identity,
            Presence::Ready { identity, seq } => {
                state.ready.remove(&seq);
                identity
            }
        };
        state.identities.remove(&identity);
        Some(Departure {
            identity,
            peers: state.peers(connection),
            connected_since: entry.handle.created_at(),
        })
    }

    /// Returns the identity bound to `connection`, if any.
    pub async fn identity_of(&self, connection: ConnectionId) -> Option<Identity> {
        let state = self.state.read().await;
        state
            .connections
            .get(&connection)
            .and_then(|entry| entry.presence.identity().cloned())
    }

    /// Returns the handle registered for `connection`.
    pub async fn handle_of(&self, connection: ConnectionId) -> Option<ConnectionHandle> {
        let state = self.state.read().await;
        state
            .connections
            .get(&connection)
            .map(|entry| entry.handle.clone())
    }

    /// Returns the lifecycle state of `connection`.
    pub async fn state_of(&self, connection: ConnectionId) -> Option<ConnectionState> {
        let state = self.state.read().await;
        state
            .connections
            .get(&connection)
            .map(|entry| entry.presence.state())
    }

    /// Returns every identified connection except `except`.
    ///
    /// Pending connections are never included.
    pub async fn identified_peers(&self, except: ConnectionId) -> Vec<ConnectionHandle> {
        self.state.read().await.peers(except)
    }

    /// Returns the ready identities in the order they became ready.
    pub async fn ready_roster(&self) -> Vec<Identity> {
        self.state.read().await.roster()
    }

    /// Records inbound activity on `connection`.
    pub async fn touch(&self, connection: ConnectionId) {
        let mut state = self.state.write().await;
        if let Some(entry) = state.connections.get_mut(&connection) {
            entry.last_activity = Utc::now();
        }
    }

    /// Returns the last time `connection` sent anything.
    pub async fn last_activity(&self, connection: ConnectionId) -> Option<DateTime<Utc>> {
        let state = self.state.read().await;
        state
            .connections
            .get(&connection)
            .map(|entry| entry.last_activity)
    }

    /// Returns the number of connections in each lifecycle state.
    pub async fn stats(&self) -> RegistryStats {
        let state = self.state.read().await;
        let pending = state.connections.len().saturating_sub(state.identities.len());
        RegistryStats {
            pending,
            identified: state.identities.len(),
            ready: state.ready.len(),
        }
    }

    /// Returns the number of registered connections.
    pub async fn len(&self) -> usize {
        self.state.read().await.connections.len()
    }

    /// Returns `true` if no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.connections.is_empty()
    }
}
