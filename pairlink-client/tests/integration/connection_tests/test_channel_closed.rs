use pairlink_client::ClientError;
use pairlink_core::{ConnectionState, DeviceType};

use crate::integration::{create_test_client, init_tracing, test_config};
use crate::utils::{PeerCall, Recorded, status, wait_for_state};

#[tokio::test]
async fn test_relay_closing_channel_tears_down() {
    init_tracing();

    let mut rig = create_test_client(test_config(DeviceType::Primary));
    let recorded = Recorded::attach(&rig.client);
    let relay = rig.joined("ROOM50").await.unwrap();
    relay.send(&status("client-1", Some(true), Some(true))).unwrap();
    rig.peers.wait_for_calls(1).await.unwrap();

    relay.close();

    wait_for_state(&rig.client, ConnectionState::Disconnected)
        .await
        .unwrap();
    let errors = recorded.errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], ClientError::Transport(_)));
    assert_eq!(
        recorded.states(),
        vec![ConnectionState::Connecting, ConnectionState::Disconnected]
    );
    assert_eq!(
        rig.peers.calls().await,
        vec![PeerCall::CreateOffer, PeerCall::Close]
    );
}

#[tokio::test]
async fn test_channel_closed_before_join_rejects_connect() {
    init_tracing();

    let mut rig = create_test_client(test_config(DeviceType::Primary));
    let (connecting, relay) = rig.start_connect("ROOM51").await.unwrap();

    relay.close();

    let err = connecting.await.unwrap().unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.is_recoverable());
    assert_eq!(rig.client.connection_state(), ConnectionState::Disconnected);
}
