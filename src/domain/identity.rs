//! Participant identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// User-chosen name of a participant, unique among identified connections.
///
/// The only server-side rule is that it is non-empty; length and charset
/// suggestions are left to clients. Comparison is exact (no trimming or
/// case folding).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Validates and wraps a raw identity string.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidIdentity`] if `raw` is empty.
    pub fn parse(raw: impl Into<String>) -> Result<Self, RelayError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(RelayError::InvalidIdentity(
                "identity must not be empty".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
