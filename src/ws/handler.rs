//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::HeaderMap;
use axum::http::header::ORIGIN;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::RelayError;

/// `GET /ws`: Upgrade HTTP connection to WebSocket.
///
/// # Errors
///
/// Returns [`RelayError::OriginRejected`] when an origin allow-list is
/// configured and the request's `Origin` does not match it.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RelayError> {
    check_origin(state.config.allowed_origin.as_deref(), &headers)?;

    let router = Arc::clone(&state.router);
    let queue_capacity = state.config.outbound_queue_capacity;
    Ok(ws.on_upgrade(move |socket| run_connection(socket, router, queue_capacity)))
}

/// Accepts any origin when `allowed` is `None`, otherwise requires an exact
/// match of the `Origin` header.
fn check_origin(allowed: Option<&str>, headers: &HeaderMap) -> Result<(), RelayError> {
    let Some(allowed) = allowed else {
        return Ok(());
    };
    let origin = headers
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if origin == allowed {
        Ok(())
    } else {
        tracing::warn!(origin, allowed, "websocket upgrade from disallowed origin");
        Err(RelayError::OriginRejected(origin.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(origin: Option<&'static str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(origin) = origin {
            map.insert(ORIGIN, HeaderValue::from_static(origin));
        }
        map
    }

    #[test]
    fn no_allow_list_accepts_anything() {
        assert!(check_origin(None, &headers(None)).is_ok());
        assert!(check_origin(None, &headers(Some("https://any.example"))).is_ok());
    }

    #[test]
    fn matching_origin_is_accepted() {
        let allowed = Some("https://room.example");
        assert!(check_origin(allowed, &headers(Some("https://room.example"))).is_ok());
    }

    #[test]
    fn mismatched_or_missing_origin_is_rejected() {
        let allowed = Some("https://room.example");
        assert_eq!(
            check_origin(allowed, &headers(Some("https://evil.example"))),
            Err(RelayError::OriginRejected("https://evil.example".to_string()))
        );
        assert!(check_origin(allowed, &headers(None)).is_err());
    }
}
