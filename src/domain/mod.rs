//! Domain layer: connection identity, lifecycle state, and the registry.
//!
//! This module contains the server-side presence model: connection
//! handles with their outbound queues, participant identities, the
//! messages the relay emits, and the registry that enforces identity
//! uniqueness across concurrent connections.

pub mod connection;
pub mod connection_id;
pub mod connection_registry;
pub mod identity;
pub mod outbound;

pub use connection::{ConnectionHandle, ConnectionState};
pub use connection_id::ConnectionId;
pub use connection_registry::{ConnectionRegistry, Departure, Readiness, RegistryStats};
pub use identity::Identity;
pub use outbound::{ControlMessage, OutboundMessage};
