//! Participant roster DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Identity, RegistryStats};

/// Response body for `GET /participants`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RosterResponse {
    /// Ready participants in the order they became ready.
    #[schema(value_type = Vec<String>)]
    pub participants: Vec<Identity>,
    /// Connections still waiting to choose an identity.
    pub pending: usize,
    /// Connections holding an identity (ready ones included).
    pub identified: usize,
    /// Connections taking part in the audio exchange.
    pub ready: usize,
    /// Snapshot timestamp.
    pub timestamp: DateTime<Utc>,
}

impl RosterResponse {
    /// Builds a snapshot from the ready roster and registry counts.
    #[must_use]
    pub fn new(participants: Vec<Identity>, stats: RegistryStats) -> Self {
        Self {
            participants,
            pending: stats.pending,
            identified: stats.identified,
            ready: stats.ready,
            timestamp: Utc::now(),
        }
    }
}
