//! WebSocket layer: upgrade handling, per-connection tasks, wire codec.
//!
//! The WebSocket endpoint at `/ws` carries the whole participant protocol:
//! identity negotiation, readiness, audio levels and signaling relay.

pub mod connection;
pub mod handler;
pub mod messages;
