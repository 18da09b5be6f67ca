use pairlink_client::{ConnectRequest, PairingClient, WebSocketConnector};
use pairlink_core::{ConnectionState, DeviceType, RoomCode, SignalingMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::integration::{init_tracing, test_config};
use crate::utils::{MockPeerFactory, RelayObservation, SIGNAL_TIMEOUT_MS, spawn_relay_stub};

#[tokio::test]
async fn test_join_over_websocket() {
    init_tracing();

    let (addr, mut observed) = spawn_relay_stub("WS0001").await.unwrap();
    let client = PairingClient::new(
        test_config(DeviceType::Companion),
        Arc::new(WebSocketConnector),
        Arc::new(MockPeerFactory::new()),
    );

    let address = format!("http://{addr}");
    let room = client.create_room(&address).await.unwrap();
    timeout(
        Duration::from_millis(SIGNAL_TIMEOUT_MS),
        client.connect(ConnectRequest::new(address, room.clone())),
    )
    .await
    .expect("join was not confirmed in time")
    .expect("connect failed");

    assert_eq!(client.connection_state(), ConnectionState::Connecting);
    let first = observed.recv().await.unwrap();
    assert_eq!(
        first,
        RelayObservation::Received(SignalingMessage::Join {
            room_code: RoomCode::from("WS0001"),
            device_type: DeviceType::Companion,
        })
    );

    client.disconnect().await.unwrap();

    let closed = timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), observed.recv())
        .await
        .expect("relay never saw the socket close");
    assert_eq!(closed, Some(RelayObservation::Closed));
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
}
