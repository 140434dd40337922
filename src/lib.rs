//! # audio-relay-gateway
//!
//! Presence tracking and signaling relay for multi-party real-time audio
//! sessions.
//!
//! Participants connect over WebSocket, claim a unique identity, announce
//! when they are ready to exchange audio, and use the relay to pass session
//! offers, answers and network candidates to each other. Media never flows
//! through this service; signaling payloads are forwarded verbatim.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler + connection tasks (ws/)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── MessageRouter (service/)
//!     │
//!     └── ConnectionRegistry (domain/)
//! ```
//!
//! ## Protocol
//!
//! | inbound `type`         | effect                                              |
//! |------------------------|-----------------------------------------------------|
//! | `set-identity`         | bind identity, reply `identity-confirmed` + `participant-list` |
//! | `ready`                | broadcast `participant-joined`                      |
//! | `audio-level`          | broadcast `audio-level` with the sender's identity  |
//! | anything else          | relay to `targetIdentity`, stamped with `identity`  |
//!
//! Disconnects of identified participants are broadcast as
//! `participant-left`. Broadcasts reach every identified connection except
//! the sender.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod ws;
