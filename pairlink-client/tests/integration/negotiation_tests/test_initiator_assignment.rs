use pairlink_client::ClientError;
use pairlink_core::{ConnectionState, DeviceType, NegotiationRole, SignalingMessage};
use std::time::Duration;

use crate::integration::{create_test_client, init_tracing, test_config};
use crate::utils::{PeerCall, Recorded, status, wait_for_state};

#[tokio::test]
async fn test_repeated_paired_status_produces_one_offer() {
    init_tracing();

    let mut rig = create_test_client(test_config(DeviceType::Primary));
    let recorded = Recorded::attach(&rig.client);
    let mut relay = rig.joined("ROOM110").await.unwrap();

    relay.send(&status("client-1", Some(true), Some(true))).unwrap();
    relay.send(&status("client-1", Some(true), Some(true))).unwrap();
    relay.send(&status("client-1", Some(true), None)).unwrap();

    assert!(matches!(
        relay.recv().await.unwrap(),
        SignalingMessage::Offer { .. }
    ));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(rig.peers.calls().await, vec![PeerCall::CreateOffer]);
    assert_eq!(rig.peers.sessions_created().await, 1);
    assert_eq!(recorded.paired().len(), 1);
}

#[tokio::test]
async fn test_relay_assignment_overrides_device_default() {
    init_tracing();

    // Both sides are primary; the relay picks the other one as initiator.
    let mut rig = create_test_client(test_config(DeviceType::Primary));
    let recorded = Recorded::attach(&rig.client);
    let relay = rig.joined("ROOM111").await.unwrap();

    relay.send(&status("client-1", Some(true), Some(false))).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(rig.peers.calls().await.is_empty());
    assert_eq!(rig.peers.sessions_created().await, 0);
    assert_eq!(recorded.paired()[0].role, NegotiationRole::Responder);
}

#[tokio::test]
async fn test_companion_waits_for_offer_by_default() {
    init_tracing();

    let mut rig = create_test_client(test_config(DeviceType::Companion));
    let recorded = Recorded::attach(&rig.client);
    let relay = rig.joined("ROOM112").await.unwrap();

    relay.send(&status("client-2", Some(true), None)).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(rig.peers.calls().await.is_empty());
    assert_eq!(recorded.paired().len(), 1);
    assert_eq!(recorded.paired()[0].role, NegotiationRole::Responder);
}

#[tokio::test]
async fn test_competing_offer_fails_the_attempt() {
    init_tracing();

    // Same device type on both sides and no relay assignment: both offer.
    let mut rig = create_test_client(test_config(DeviceType::Primary));
    let recorded = Recorded::attach(&rig.client);
    let mut relay = rig.joined("ROOM113").await.unwrap();

    relay.send(&status("client-1", Some(true), None)).unwrap();
    assert!(matches!(
        relay.recv().await.unwrap(),
        SignalingMessage::Offer { .. }
    ));
    relay
        .send(&SignalingMessage::Offer {
            payload: pairlink_core::SessionDescription::offer("v=0 competing"),
        })
        .unwrap();

    wait_for_state(&rig.client, ConnectionState::Error)
        .await
        .unwrap();
    relay.wait_closed().await.unwrap();
    assert_eq!(
        rig.peers.calls().await,
        vec![PeerCall::CreateOffer, PeerCall::Close]
    );
    assert!(matches!(
        recorded.errors().as_slice(),
        [ClientError::Negotiation(_)]
    ));
}
