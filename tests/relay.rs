//! End-to-end relay tests over real WebSocket and HTTP connections.

#![allow(clippy::panic, missing_docs)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use ride_relay::app_state::AppState;
use ride_relay::config::RelayConfig;
use ride_relay::server::build_app;
use ride_relay::service::Dispatcher;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    let config = RelayConfig::default();
    let app = build_app(
        AppState::new(Dispatcher::new(config.outbound_buffer_capacity)),
        &config,
    );
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let Ok((client, _)) = connect_async(format!("ws://{addr}/ws")).await else {
        panic!("ws connect failed");
    };
    client
}

async fn emit(client: &mut Client, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    if client.send(Message::text(frame)).await.is_err() {
        panic!("ws send failed");
    }
}

async fn next_frame(client: &mut Client) -> Value {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(2), client.next()).await;
        let Ok(Some(Ok(msg))) = next else {
            panic!("no frame received");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                panic!("frame is not json");
            };
            return value;
        }
    }
}

async fn assert_silent(client: &mut Client) {
    let next = tokio::time::timeout(Duration::from_millis(150), client.next()).await;
    assert!(next.is_err(), "unexpected frame: {next:?}");
}

/// Round-trips `getActiveConnections` so every earlier frame from this
/// client is known to be processed.
async fn sync(client: &mut Client) -> Value {
    emit(client, "getActiveConnections", Value::Null).await;
    let reply = next_frame(client).await;
    assert_eq!(reply["event"], "activeConnectionsInfo");
    reply["data"].clone()
}

#[tokio::test]
async fn status_update_and_cancellation_flow() {
    let addr = spawn_server().await;
    let mut driver = connect(addr).await;
    let mut rider = connect(addr).await;

    emit(&mut driver, "joinDriver", json!("V1")).await;
    emit(
        &mut driver,
        "joinBooking",
        json!({ "vehicleId": "V1", "bookingId": "B1" }),
    )
    .await;
    sync(&mut driver).await;
    emit(
        &mut rider,
        "joinUser",
        json!({ "userId": "U1", "bookingId": "B1" }),
    )
    .await;
    sync(&mut rider).await;

    emit(
        &mut driver,
        "rideStatusUpdate",
        json!({ "bookingId": "B1", "vehicleId": "V1", "status": "enroute" }),
    )
    .await;
    let changed = next_frame(&mut rider).await;
    assert_eq!(changed["event"], "rideStatusChanged");
    assert_eq!(changed["data"]["status"], "enroute");
    assert_eq!(changed["data"]["vehicleId"], "V1");
    assert!(changed["data"].get("message").is_none());

    emit(
        &mut rider,
        "cancelRide",
        json!({ "bookingId": "B1", "userId": "U1" }),
    )
    .await;
    for client in [&mut driver, &mut rider] {
        let mut names = Vec::new();
        for _ in 0..3 {
            let frame = next_frame(client).await;
            assert_eq!(frame["data"]["vehicleId"], "V1");
            names.push(frame["event"].as_str().unwrap_or_default().to_string());
        }
        assert_eq!(names, ["cancelRide", "rideCancelled", "rideStatusChanged"]);
    }

    let snapshot = sync(&mut rider).await;
    assert_eq!(snapshot["activeBookings"], json!([]));
}

#[tokio::test]
async fn active_connections_and_disconnect() {
    let addr = spawn_server().await;
    let mut v1 = connect(addr).await;
    let mut v2 = connect(addr).await;
    let mut u1 = connect(addr).await;

    emit(&mut v1, "joinDriver", json!("V1")).await;
    emit(
        &mut v1,
        "joinBooking",
        json!({ "vehicleId": "V1", "bookingId": "B1" }),
    )
    .await;
    sync(&mut v1).await;
    emit(&mut v2, "joinDriver", json!({ "vehicleId": "V2" })).await;
    sync(&mut v2).await;
    emit(&mut u1, "joinUser", json!({ "userId": "U1" })).await;

    let snapshot = sync(&mut u1).await;
    assert_eq!(
        snapshot,
        json!({ "activeDrivers": ["V1", "V2"], "activeUsersCount": 1, "activeBookings": ["B1"] })
    );
    assert_silent(&mut v1).await;

    let _ = v1.close(None).await;
    drop(v1);
    // Disconnect cleanup runs on the server task; poll until it lands.
    let mut drivers = Value::Null;
    for _ in 0..20 {
        drivers = sync(&mut u1).await["activeDrivers"].clone();
        if drivers == json!(["V2"]) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert_eq!(drivers, json!(["V2"]));
    // The booking outlives its driver's channel.
    assert_eq!(sync(&mut u1).await["activeBookings"], json!(["B1"]));
}

#[tokio::test]
async fn rest_surface_reaches_websocket_clients() {
    let addr = spawn_server().await;
    let mut rider = connect(addr).await;
    emit(
        &mut rider,
        "joinUser",
        json!({ "userId": "U1", "bookingId": "B7" }),
    )
    .await;
    sync(&mut rider).await;

    let http = reqwest::Client::new();

    let health = tokio_test::assert_ok!(http.get(format!("http://{addr}/health")).send().await);
    assert!(health.status().is_success());

    let notify = tokio_test::assert_ok!(
        http.post(format!("http://{addr}/api/v1/bookings/B7/notify"))
            .json(&json!({ "event": "paymentReceived", "data": { "amount": 42 } }))
            .send()
            .await
    );
    assert_eq!(notify.status().as_u16(), 202);
    let frame = next_frame(&mut rider).await;
    assert_eq!(frame["event"], "paymentReceived");
    assert_eq!(frame["data"]["amount"], 42);

    let blank = tokio_test::assert_ok!(
        http.post(format!("http://{addr}/api/v1/bookings/B7/notify"))
            .json(&json!({ "event": "  " }))
            .send()
            .await
    );
    assert_eq!(blank.status().as_u16(), 400);

    let emitted = tokio_test::assert_ok!(
        http.post(format!("http://{addr}/api/v1/test/emit"))
            .send()
            .await
    );
    let body: Value = tokio_test::assert_ok!(emitted.json().await);
    assert_eq!(body["delivered"], 1);
    let frame = next_frame(&mut rider).await;
    assert_eq!(frame["event"], "test-event");
    assert_eq!(frame["data"]["message"], "testing");

    let connections = tokio_test::assert_ok!(
        http.get(format!("http://{addr}/api/v1/connections"))
            .send()
            .await
    );
    let body: Value = tokio_test::assert_ok!(connections.json().await);
    assert_eq!(body["activeUsersCount"], 1);
}
