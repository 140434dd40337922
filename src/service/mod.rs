//! Service layer: inbound dispatch and outbound delivery.

pub mod message_router;

pub use message_router::{ConnectionEvent, DispatchOutcome, MessageRouter};
