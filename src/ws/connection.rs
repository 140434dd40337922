//! WebSocket connection task.
//!
//! Handles the read/write loop for a single WebSocket connection: inbound
//! frames become [`ConnectionEvent`]s for the router, and messages queued
//! on the connection's outbound channel are written back to the socket.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::encode;
use crate::domain::ConnectionHandle;
use crate::service::{ConnectionEvent, MessageRouter};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Registers the connection as pending before reading anything.
/// - Feeds text (and UTF-8 binary) frames to the router.
/// - Drains the outbound queue into the socket.
/// - Always finishes with a `Closed` event; teardown is idempotent, so an
///   earlier `Error` event for the same connection is harmless.
pub async fn run_connection(socket: WebSocket, router: Arc<MessageRouter>, queue_capacity: usize) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (handle, mut outbound_rx) = ConnectionHandle::channel(queue_capacity);
    let connection = handle.id();
    router.handle_event(ConnectionEvent::Opened(handle)).await;

    loop {
        tokio::select! {
            // Incoming frame from client
            frame = ws_rx.next() => {
                let payload = match frame {
                    Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
                    // Invalid UTF-8 goes through as an empty payload and is
                    // answered like any other malformed message.
                    Some(Ok(Message::Binary(bytes))) => {
                        String::from_utf8(bytes.to_vec()).unwrap_or_default()
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        router
                            .handle_event(ConnectionEvent::Error {
                                connection,
                                cause: err.to_string(),
                            })
                            .await;
                        break;
                    }
                };
                router
                    .handle_event(ConnectionEvent::Message { connection, payload })
                    .await;
            }
            // Message queued for this client
            outbound = outbound_rx.recv() => {
                let Some(message) = outbound else {
                    break;
                };
                let frame = match encode(&message) {
                    Ok(frame) => frame,
                    Err(err) => {
                        tracing::warn!(%connection, error = %err, "dropping unencodable message");
                        continue;
                    }
                };
                if ws_tx.send(Message::text(frame)).await.is_err() {
                    break;
                }
            }
        }
    }

    router.handle_event(ConnectionEvent::Closed(connection)).await;
    tracing::debug!(%connection, "ws connection closed");
}
