//! WebSocket wire codec: inbound classification and outbound encoding.
//!
//! Every payload is a JSON object discriminated by its `type` field. The
//! relay understands `set-identity`, `ready` and `audio-level`; any other
//! type is a signal addressed to another participant through
//! `targetIdentity` and is forwarded without looking at the rest of the
//! body.

use serde_json::{Map, Value};

use crate::domain::outbound::IDENTITY_FIELD;
use crate::domain::{Identity, OutboundMessage};
use crate::error::RelayError;

/// Field naming the recipient of a signal.
pub const TARGET_FIELD: &str = "targetIdentity";

/// A classified inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `{type:"set-identity", identity}`.
    SetIdentity {
        /// Requested identity, not yet validated.
        identity: String,
    },
    /// `{type:"ready"}`.
    Ready,
    /// `{type:"audio-level", level}`.
    AudioLevel {
        /// Level as sent by the client, forwarded untouched.
        level: Value,
    },
    /// Any other type, relayed point to point.
    Signal(SignalMessage),
}

/// Opaque payload addressed to a single participant.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMessage {
    kind: String,
    target: String,
    body: Map<String, Value>,
}

impl SignalMessage {
    /// Returns the `type` of the signal (e.g. `"offer"`).
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the identity of the intended recipient.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Turns the signal into the payload the recipient receives.
    ///
    /// `targetIdentity` is already stripped; `identity` is set to the
    /// sender, replacing anything the client put there.
    #[must_use]
    pub fn stamp(self, sender: &Identity) -> OutboundMessage {
        let mut body = self.body;
        body.insert(
            IDENTITY_FIELD.to_string(),
            Value::String(sender.to_string()),
        );
        OutboundMessage::Signal(body)
    }
}

impl InboundMessage {
    /// Parses and classifies a text payload.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::FormatError`] if the payload is not a JSON
    /// object with a string `type`, or lacks the fields its type requires.
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RelayError::FormatError(e.to_string()))?;
        let Value::Object(mut body) = value else {
            return Err(RelayError::FormatError(
                "expected a JSON object".to_string(),
            ));
        };
        let kind = match body.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            _ => {
                return Err(RelayError::FormatError(
                    "missing string field `type`".to_string(),
                ));
            }
        };

        match kind.as_str() {
            "set-identity" => match body.remove(IDENTITY_FIELD) {
                Some(Value::String(identity)) => Ok(Self::SetIdentity { identity }),
                _ => Err(RelayError::FormatError(
                    "set-identity requires a string `identity`".to_string(),
                )),
            },
            "ready" => Ok(Self::Ready),
            "audio-level" => body
                .remove("level")
                .map(|level| Self::AudioLevel { level })
                .ok_or_else(|| RelayError::FormatError("audio-level requires `level`".to_string())),
            _ => match body.remove(TARGET_FIELD) {
                Some(Value::String(target)) => Ok(Self::Signal(SignalMessage { kind, target, body })),
                _ => Err(RelayError::FormatError(format!(
                    "{kind} requires a string `{TARGET_FIELD}`"
                ))),
            },
        }
    }

    /// Returns the wire `type` of the message.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::SetIdentity { .. } => "set-identity",
            Self::Ready => "ready",
            Self::AudioLevel { .. } => "audio-level",
            Self::Signal(signal) => signal.kind(),
        }
    }
}

/// Serializes an outbound message to its JSON text frame.
///
/// # Errors
///
/// Returns [`RelayError::Internal`] if serialization fails.
pub fn encode(message: &OutboundMessage) -> Result<String, RelayError> {
    serde_json::to_string(message).map_err(|e| RelayError::Internal(e.to_string()))
}
