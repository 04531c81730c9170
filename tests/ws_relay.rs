//! End-to-end tests: real server, real WebSocket clients.

#![allow(clippy::panic, missing_docs)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use gcode_relay::api;
use gcode_relay::app_state::AppState;
use gcode_relay::config::RelayConfig;
use gcode_relay::service::{NamespaceHandle, RelayNamespace};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("cannot bind");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    let config = RelayConfig::default();
    let state = AppState {
        namespace: NamespaceHandle::spawn(RelayNamespace::with_defaults(config.svg_stroke_width)),
        outbox_capacity: config.outbox_capacity,
    };
    let app = api::build_app(state, &config);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    match tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await {
        Ok((client, _)) => client,
        Err(e) => panic!("ws connect failed: {e}"),
    }
}

async fn send(client: &mut Client, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    if let Err(e) = client.send(Message::text(frame)).await {
        panic!("send failed: {e}");
    }
}

async fn recv(client: &mut Client) -> (String, Value) {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), client.next()).await;
        let Ok(Some(Ok(message))) = next else {
            panic!("no frame received");
        };
        if let Message::Text(text) = message {
            let value: Value = serde_json::from_str(text.as_str()).unwrap_or_default();
            let event = value
                .get("event")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let data = value.get("data").cloned().unwrap_or_default();
            return (event, data);
        }
    }
}

async fn assert_silent(client: &mut Client) {
    let next = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(next.is_err(), "unexpected frame: {next:?}");
}

async fn status(addr: SocketAddr) -> Value {
    match reqwest::get(format!("http://{addr}/status")).await {
        Ok(resp) => resp.json().await.unwrap_or_default(),
        Err(e) => panic!("status request failed: {e}"),
    }
}

async fn wait_for_consumer(addr: SocketAddr, expected: bool) {
    for _ in 0..50 {
        let s = status(addr).await;
        if s.get("has_active_consumer").and_then(Value::as_bool) == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("consumer state never became {expected}");
}

#[tokio::test]
async fn visualize_streams_to_registered_consumer() {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir");
    };
    let path = dir.path().join("job.gcode");
    if std::fs::write(&path, "G1 X1 F60\nG1 Y1\nG1 X0\n").is_err() {
        panic!("write fixture");
    }
    let filename = path.to_string_lossy().into_owned();

    let addr = start_server().await;
    let mut consumer = connect(addr).await;
    send(&mut consumer, "register", json!({})).await;
    wait_for_consumer(addr, true).await;

    let mut producer = connect(addr).await;
    send(&mut producer, "gcode_visualize", json!(filename)).await;
    assert_eq!(recv(&mut producer).await, ("ok".to_string(), json!("ok")));

    let mut lines = Vec::new();
    for _ in 0..3 {
        let (event, data) = recv(&mut consumer).await;
        assert_eq!(event, "gcode");
        lines.push(data);
    }
    assert_eq!(lines, vec![json!("G1 X1 F60\n"), json!("G1 Y1\n"), json!("G1 X0\n")]);
    assert_eq!(recv(&mut consumer).await.0, "gcode_finished");
    let (event, positions) = recv(&mut consumer).await;
    assert_eq!(event, "gcode_pos");
    assert_eq!(positions.as_array().map(Vec::len), Some(3));
    assert_eq!(
        recv(&mut consumer).await,
        ("gcode_fline".to_string(), json!([0, 1, 2]))
    );
    assert_silent(&mut producer).await;
}

#[tokio::test]
async fn relay_reaches_only_the_latest_registrant() {
    let addr = start_server().await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    let mut producer = connect(addr).await;

    send(&mut first, "register", Value::Null).await;
    wait_for_consumer(addr, true).await;
    send(&mut second, "register", Value::Null).await;
    // Frames from one socket are handled in order: once the border ack
    // arrives, the registration before it has been applied.
    send(&mut second, "gcode_border", Value::Null).await;
    assert_eq!(recv(&mut second).await.0, "ok");

    send(&mut producer, "relay", json!({"event": "foo", "data": "bar"})).await;
    assert_eq!(recv(&mut second).await, ("foo".to_string(), json!("bar")));
    assert_silent(&mut first).await;
    assert_silent(&mut producer).await;
}

#[tokio::test]
async fn consumer_disconnect_stops_relay() {
    let addr = start_server().await;
    let mut consumer = connect(addr).await;
    let mut producer = connect(addr).await;
    send(&mut consumer, "register", Value::Null).await;
    wait_for_consumer(addr, true).await;

    let _ = consumer.close(None).await;
    wait_for_consumer(addr, false).await;

    send(&mut producer, "relay", json!({"event": "foo"})).await;
    assert_silent(&mut producer).await;
}

#[tokio::test]
async fn malformed_frames_are_ignored() {
    let addr = start_server().await;
    let mut client = connect(addr).await;
    if client.send(Message::text("{not json")).await.is_err() {
        panic!("send failed");
    }
    send(&mut client, "gcode_border", json!(12)).await;
    assert_eq!(recv(&mut client).await.0, "ok");
}

#[tokio::test]
async fn health_endpoint_responds() {
    let addr = start_server().await;
    let Ok(resp) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("health request failed");
    };
    assert!(resp.status().is_success());
}
