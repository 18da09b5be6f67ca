use pairlink_client::{ClientConfig, KeepaliveConfig, PeerEvent, PeerState};
use pairlink_core::{ConnectionState, DeviceType, SdpType, SignalingMessage};
use std::time::Duration;

use crate::integration::{TestRig, create_test_client, init_tracing};
use crate::utils::{PeerCall, Recorded, RelayEnd, answer, status, wait_for_state};

/// Joins, offers, applies the relay's answer and reports the peer connected.
async fn connect_and_answer(rig: &mut TestRig, room: &str) -> RelayEnd {
    let mut relay = rig.joined(room).await.unwrap();
    relay.send(&status("client-1", Some(true), Some(true))).unwrap();
    assert!(matches!(
        relay.recv().await.unwrap(),
        SignalingMessage::Offer { .. }
    ));
    relay.send(&answer("v=0 a")).unwrap();
    rig.peers.wait_for_calls(2).await.unwrap();

    let peer = rig.peers.session_sink(0).await.unwrap();
    peer.send(PeerEvent::StateChanged(PeerState::Connected)).await;
    wait_for_state(&rig.client, ConnectionState::Connected)
        .await
        .unwrap();
    relay
}

#[tokio::test(start_paused = true)]
async fn test_default_client_survives_quiet_signaling() {
    init_tracing();

    let mut rig = create_test_client(ClientConfig::default().with_device_type(DeviceType::Primary));
    let recorded = Recorded::attach(&rig.client);
    let relay = connect_and_answer(&mut rig, "ROOM26").await;

    tokio::time::sleep(Duration::from_secs(50)).await;

    assert_eq!(rig.client.connection_state(), ConnectionState::Connected);
    assert!(relay.is_open());
    assert!(recorded.errors().is_empty());
    assert_eq!(
        rig.peers.calls().await,
        vec![
            PeerCall::CreateOffer,
            PeerCall::SetRemote(SdpType::Answer, "v=0 a".into()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_tolerates_relay_that_never_pongs() {
    init_tracing();

    let config = ClientConfig::default()
        .with_device_type(DeviceType::Primary)
        .with_keepalive(Some(KeepaliveConfig::default()));
    let mut rig = create_test_client(config);
    let recorded = Recorded::attach(&rig.client);
    let mut relay = connect_and_answer(&mut rig, "ROOM27").await;

    tokio::time::sleep(Duration::from_secs(50)).await;

    assert_eq!(rig.client.connection_state(), ConnectionState::Connected);
    assert!(recorded.errors().is_empty());
    for _ in 0..3 {
        assert_eq!(relay.recv().await.unwrap(), SignalingMessage::Ping);
    }
}
