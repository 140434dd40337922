//! End-to-end tests: real server on an ephemeral port, real WebSocket
//! clients.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use audio_relay_gateway::app_state::AppState;
use audio_relay_gateway::config::RelayConfig;
use audio_relay_gateway::server::serve;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const ORIGIN: &str = "https://room.example";

async fn start(config: RelayConfig) -> SocketAddr {
    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind ephemeral port");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("local addr");
    };
    tokio::spawn(serve(listener, AppState::new(config)));
    addr
}

async fn connect(addr: SocketAddr) -> Socket {
    let Ok((socket, _)) = connect_async(format!("ws://{addr}/ws")).await else {
        panic!("websocket handshake");
    };
    socket
}

async fn send(socket: &mut Socket, payload: Value) {
    if socket.send(Message::text(payload.to_string())).await.is_err() {
        panic!("send frame");
    }
}

async fn recv(socket: &mut Socket) -> Value {
    let next = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(Ok(frame)) = socket.next().await {
            if let Message::Text(text) = frame {
                return serde_json::from_str::<Value>(text.as_str()).ok();
            }
        }
        None
    })
    .await;
    let Ok(Some(value)) = next else {
        panic!("expected a message");
    };
    value
}

async fn assert_silent(socket: &mut Socket) {
    let next = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(next.is_err(), "unexpected frame: {next:?}");
}

async fn join(addr: SocketAddr, name: &str) -> Socket {
    let mut socket = connect(addr).await;
    send(&mut socket, json!({ "type": "set-identity", "identity": name })).await;
    assert_eq!(recv(&mut socket).await, json!({ "type": "identity-confirmed" }));
    let roster = recv(&mut socket).await;
    assert_eq!(roster.get("type"), Some(&json!("participant-list")));
    socket
}

#[tokio::test]
async fn two_participant_session() {
    let addr = start(RelayConfig::default()).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;

    send(&mut a, json!({ "type": "set-identity", "identity": "alice" })).await;
    assert_eq!(recv(&mut a).await, json!({ "type": "identity-confirmed" }));
    assert_eq!(
        recv(&mut a).await,
        json!({ "type": "participant-list", "participants": [] })
    );

    send(&mut b, json!({ "type": "set-identity", "identity": "alice" })).await;
    let rejected = recv(&mut b).await;
    assert_eq!(rejected.get("type"), Some(&json!("identity-error")));

    send(&mut b, json!({ "type": "set-identity", "identity": "bob" })).await;
    assert_eq!(recv(&mut b).await, json!({ "type": "identity-confirmed" }));
    assert_eq!(
        recv(&mut b).await,
        json!({ "type": "participant-list", "participants": [] })
    );

    send(&mut a, json!({ "type": "ready" })).await;
    assert_eq!(
        recv(&mut b).await,
        json!({ "type": "participant-joined", "identity": "alice" })
    );

    send(&mut b, json!({ "type": "ready" })).await;
    assert_eq!(
        recv(&mut a).await,
        json!({ "type": "participant-joined", "identity": "bob" })
    );

    send(
        &mut a,
        json!({ "type": "offer", "sdp": "v=0", "targetIdentity": "bob" }),
    )
    .await;
    assert_eq!(
        recv(&mut b).await,
        json!({ "type": "offer", "sdp": "v=0", "identity": "alice" })
    );

    if a.close(None).await.is_err() {
        panic!("close alice");
    }
    assert_eq!(
        recv(&mut b).await,
        json!({ "type": "participant-left", "identity": "alice" })
    );
}

#[tokio::test]
async fn audio_levels_skip_sender() {
    let addr = start(RelayConfig::default()).await;
    let mut a = join(addr, "A").await;
    let mut b = join(addr, "B").await;
    let mut c = join(addr, "C").await;

    send(&mut a, json!({ "type": "audio-level", "level": 0.42 })).await;
    let expected = json!({ "type": "audio-level", "identity": "A", "level": 0.42 });
    assert_eq!(recv(&mut b).await, expected);
    assert_eq!(recv(&mut c).await, expected);
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn malformed_frame_keeps_connection_usable() {
    let addr = start(RelayConfig::default()).await;
    let mut a = connect(addr).await;

    if a.send(Message::text("{oops")).await.is_err() {
        panic!("send frame");
    }
    assert_eq!(recv(&mut a).await.get("type"), Some(&json!("format-error")));

    send(&mut a, json!({ "type": "set-identity", "identity": "alice" })).await;
    assert_eq!(recv(&mut a).await, json!({ "type": "identity-confirmed" }));
}

#[tokio::test]
async fn roster_endpoint_reports_ready_participants() {
    let addr = start(RelayConfig::default()).await;
    let mut a = join(addr, "alice").await;
    let mut b = join(addr, "bob").await;
    send(&mut a, json!({ "type": "ready" })).await;
    let _joined = recv(&mut b).await;

    let Ok(response) = reqwest::get(format!("http://{addr}/api/v1/participants")).await else {
        panic!("roster request");
    };
    let Ok(body) = response.json::<Value>().await else {
        panic!("roster body");
    };
    assert_eq!(body.get("participants"), Some(&json!(["alice"])));
    assert_eq!(body.get("identified"), Some(&json!(2)));
}

#[tokio::test]
async fn origin_allow_list_is_enforced() {
    let addr = start(RelayConfig {
        allowed_origin: Some(ORIGIN.to_string()),
        ..RelayConfig::default()
    })
    .await;

    match connect_async(format!("ws://{addr}/ws")).await {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 403),
        Err(err) => panic!("expected 403, got {err}"),
        Ok(_) => panic!("expected 403, handshake succeeded"),
    }

    let Ok(mut request) = format!("ws://{addr}/ws").into_client_request() else {
        panic!("valid request");
    };
    request
        .headers_mut()
        .insert("origin", HeaderValue::from_static(ORIGIN));
    assert!(connect_async(request).await.is_ok());
}
