//! Messages the relay sends to participants.
//!
//! Control messages are produced by the relay itself and carry a fixed
//! shape. Signals are opaque session-negotiation payloads forwarded from
//! one participant to another; their body is never inspected.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Identity;

/// Field carrying the sender's identity on relayed and broadcast messages.
pub const IDENTITY_FIELD: &str = "identity";

/// Outbound payload queued for a single connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    /// Message generated by the relay.
    Control(ControlMessage),
    /// Opaque payload relayed from another participant, already stamped
    /// with the sender's identity. Includes its own `type` field.
    Signal(Map<String, Value>),
}

/// Relay-generated messages, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// The requested identity was bound to the connection.
    IdentityConfirmed,
    /// The requested identity was refused; the connection stays pending.
    IdentityError {
        /// Reason shown to the user.
        message: String,
    },
    /// Participants currently ready, in the order they became ready.
    ParticipantList {
        /// Ready identities.
        participants: Vec<Identity>,
    },
    /// A participant became ready.
    ParticipantJoined {
        /// Identity of the new participant.
        identity: Identity,
    },
    /// An identified participant disconnected.
    ParticipantLeft {
        /// Identity of the departed participant.
        identity: Identity,
    },
    /// Audio level sample from another participant.
    AudioLevel {
        /// Identity of the speaker.
        identity: Identity,
        /// Level exactly as the speaker sent it.
        level: Value,
    },
    /// The last inbound payload could not be understood.
    FormatError {
        /// Generic description of the problem.
        message: String,
    },
}

impl OutboundMessage {
    /// Returns the value of the `type` field this message serializes with.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Control(control) => control.kind(),
            Self::Signal(body) => body.get("type").and_then(Value::as_str).unwrap_or(""),
        }
    }
}

impl ControlMessage {
    /// Returns the wire `type` tag of this message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::IdentityConfirmed => "identity-confirmed",
            Self::IdentityError { .. } => "identity-error",
            Self::ParticipantList { .. } => "participant-list",
            Self::ParticipantJoined { .. } => "participant-joined",
            Self::ParticipantLeft { .. } => "participant-left",
            Self::AudioLevel { .. } => "audio-level",
            Self::FormatError { .. } => "format-error",
        }
    }
}

impl From<ControlMessage> for OutboundMessage {
    fn from(control: ControlMessage) -> Self {
        Self::Control(control)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity(raw: &str) -> Identity {
        let Ok(id) = Identity::parse(raw) else {
            panic!("valid identity");
        };
        id
    }

    #[test]
    fn identity_confirmed_has_only_type() {
        let msg = OutboundMessage::from(ControlMessage::IdentityConfirmed);
        let value = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(value, json!({ "type": "identity-confirmed" }));
    }

    #[test]
    fn participant_list_serializes_identities() {
        let msg = OutboundMessage::from(ControlMessage::ParticipantList {
            participants: vec![identity("alice"), identity("bob")],
        });
        let value = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(
            value,
            json!({ "type": "participant-list", "participants": ["alice", "bob"] })
        );
    }

    #[test]
    fn audio_level_keeps_level_verbatim() {
        let msg = OutboundMessage::from(ControlMessage::AudioLevel {
            identity: identity("A"),
            level: json!(0.42),
        });
        let value = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(
            value,
            json!({ "type": "audio-level", "identity": "A", "level": 0.42 })
        );
    }

    #[test]
    fn signal_serializes_body_as_is() {
        let Value::Object(body) = json!({ "type": "offer", "sdp": "X", "identity": "alice" })
        else {
            panic!("object literal");
        };
        let msg = OutboundMessage::Signal(body);
        assert_eq!(msg.kind(), "offer");
        let value = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(value, json!({ "type": "offer", "sdp": "X", "identity": "alice" }));
    }

    #[test]
    fn kind_matches_wire_tag() {
        let msg = OutboundMessage::from(ControlMessage::ParticipantLeft {
            identity: identity("bob"),
        });
        let value = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(value.get("type").and_then(Value::as_str), Some(msg.kind()));
    }
}
