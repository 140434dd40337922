//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;

/// Default bind address when neither `LISTEN_ADDR` nor `PORT` is set.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default per-connection outbound queue capacity.
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// When set, WebSocket upgrades must carry exactly this `Origin`.
    pub allowed_origin: Option<String>,

    /// Capacity of each connection's outbound queue.
    pub outbound_queue_capacity: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            allowed_origin: None,
            outbound_queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
            log_format: LogFormat::Text,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the listen address cannot be parsed as a
    /// [`SocketAddr`].
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Falls back to defaults for missing or invalid optional values.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` (or `0.0.0.0:$PORT`) cannot be
    /// parsed as a [`SocketAddr`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, std::net::AddrParseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = match (lookup("LISTEN_ADDR"), lookup("PORT")) {
            (Some(addr), _) => addr.parse()?,
            (None, Some(port)) => format!("0.0.0.0:{port}").parse()?,
            (None, None) => DEFAULT_LISTEN_ADDR.parse()?,
        };

        let allowed_origin = lookup("ALLOWED_ORIGIN").filter(|origin| !origin.is_empty());

        let outbound_queue_capacity = lookup("OUTBOUND_QUEUE_CAPACITY")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|capacity| *capacity > 0)
            .unwrap_or(DEFAULT_OUTBOUND_QUEUE_CAPACITY);

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            allowed_origin,
            outbound_queue_capacity,
            log_format,
        })
    }
}
