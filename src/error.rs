//! Relay error types with wire and HTTP mappings.
//!
//! [`RelayError`] is the central error type for the relay. Protocol
//! variants are reported to the offending connection only (or dropped);
//! none of them is fatal to the process. The few variants that can surface
//! on the HTTP side map to a status code and a structured JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ConnectionId;

/// Structured JSON error response body.
///
/// All HTTP error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4003,
///     "message": "origin not allowed: https://evil.example",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status               |
/// |-----------|----------------------|---------------------------|
/// | 1000–1999 | Payload / identity   | 400 Bad Request           |
/// | 2000–2999 | Session state        | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server / transport   | 500 / 503                 |
/// | 4000–4999 | Access               | 403 Forbidden             |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Another live connection already holds the requested identity.
    #[error("identity already in use: {0}")]
    IdentityTaken(String),

    /// The requested identity is not acceptable (e.g. empty).
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The connection already has an identity bound.
    #[error("identity already set for this connection")]
    AlreadyIdentified,

    /// The connection has not completed `set-identity` yet.
    #[error("connection has no identity")]
    NotIdentified,

    /// The connection is not (or no longer) registered.
    #[error("connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// The inbound payload could not be parsed.
    #[error("invalid message format: {0}")]
    FormatError(String),

    /// No connection holds the unicast target identity.
    #[error("target not found: {0}")]
    TargetNotFound(String),

    /// The outbound queue of a connection is closed or full.
    #[error("send to {connection} failed: {reason}")]
    TransportSendFailure {
        /// Recipient connection.
        connection: ConnectionId,
        /// Why the payload could not be queued.
        reason: String,
    },

    /// The WebSocket upgrade came from an origin that is not allowed.
    #[error("origin not allowed: {0}")]
    OriginRejected(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::FormatError(_) => 1001,
            Self::InvalidIdentity(_) => 1002,
            Self::IdentityTaken(_) => 2001,
            Self::AlreadyIdentified => 2002,
            Self::NotIdentified => 2003,
            Self::ConnectionNotFound(_) => 2004,
            Self::TargetNotFound(_) => 2005,
            Self::Internal(_) => 3000,
            Self::TransportSendFailure { .. } => 3001,
            Self::OriginRejected(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::FormatError(_) | Self::InvalidIdentity(_) => StatusCode::BAD_REQUEST,
            Self::IdentityTaken(_) | Self::AlreadyIdentified | Self::NotIdentified => {
                StatusCode::CONFLICT
            }
            Self::ConnectionNotFound(_) | Self::TargetNotFound(_) => StatusCode::NOT_FOUND,
            Self::TransportSendFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OriginRejected(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn identity_taken_is_conflict() {
        let err = RelayError::IdentityTaken("alice".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2001);
        assert_eq!(err.to_string(), "identity already in use: alice");
    }

    #[test]
    fn origin_rejected_renders_json_body() {
        let response = RelayError::OriginRejected("https://evil.example".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn error_body_skips_missing_details() {
        let body = ErrorResponse {
            error: ErrorBody {
                code: 1001,
                message: "invalid message format: expected value".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_string(&body).unwrap_or_default();
        assert!(json.contains("\"code\":1001"));
        assert!(!json.contains("details"));
    }
}
