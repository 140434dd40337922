//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::domain::ConnectionRegistry;
use crate::service::MessageRouter;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Router every WebSocket connection feeds its events into.
    pub router: Arc<MessageRouter>,
    /// Runtime configuration.
    pub config: Arc<RelayConfig>,
}

impl AppState {
    /// Builds the state around a fresh, empty registry.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            router: Arc::new(MessageRouter::new(registry)),
            config: Arc::new(config),
        }
    }

    /// Returns the connection registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.router.registry()
    }
}
