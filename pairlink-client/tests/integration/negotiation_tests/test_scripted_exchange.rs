use pairlink_client::{PeerEvent, PeerState, RemoteAudioStream, RemoteStream};
use pairlink_core::{ConnectionState, DeviceType, NegotiationRole, SdpType, SignalingMessage};
use std::sync::{Arc, Mutex};

use crate::integration::{create_test_client, init_tracing, test_config};
use crate::utils::{
    PeerCall, Recorded, answer, candidate, ice, mock_stream, status, wait_for_state, wait_until,
};

#[tokio::test]
async fn test_scripted_exchange_reaches_connected() {
    init_tracing();

    let mut rig = create_test_client(test_config(DeviceType::Primary));
    let recorded = Recorded::attach(&rig.client);
    let streams: Arc<Mutex<Vec<RemoteStream>>> = Arc::new(Mutex::new(Vec::new()));
    let s = streams.clone();
    rig.client
        .on::<RemoteAudioStream, _>(move |stream| s.lock().unwrap().push(stream.clone()));

    let mut relay = rig.joined("ROOM90").await.unwrap();

    // Paired: this side is the initiator and offers.
    relay.send(&status("client-1", Some(true), Some(true))).unwrap();
    let SignalingMessage::Offer { payload } = relay.recv().await.unwrap() else {
        panic!("expected an offer");
    };
    assert_eq!(payload.sdp_type, SdpType::Offer);

    // Two local candidates go out as ice-candidate messages.
    let sink = rig.peers.session_sink(0).await.unwrap();
    sink.send(PeerEvent::CandidateGenerated(ice("local-1"))).await;
    sink.send(PeerEvent::CandidateGenerated(ice("local-2"))).await;
    assert_eq!(relay.recv().await.unwrap(), candidate("local-1"));
    assert_eq!(relay.recv().await.unwrap(), candidate("local-2"));

    // Answer and two remote candidates come back.
    relay.send(&answer("v=0 remote-answer")).unwrap();
    relay.send(&candidate("remote-1")).unwrap();
    relay.send(&candidate("remote-2")).unwrap();

    let calls = rig.peers.wait_for_calls(4).await.unwrap();
    assert_eq!(
        calls,
        vec![
            PeerCall::CreateOffer,
            PeerCall::SetRemote(SdpType::Answer, "v=0 remote-answer".into()),
            PeerCall::AddCandidate("remote-1".into()),
            PeerCall::AddCandidate("remote-2".into()),
        ]
    );

    sink.send(PeerEvent::StateChanged(PeerState::Connecting)).await;
    sink.send(PeerEvent::StateChanged(PeerState::Connected)).await;
    sink.send(PeerEvent::TrackAdded(mock_stream("remote-stream"))).await;
    // A second track of the same stream is not announced again.
    sink.send(PeerEvent::TrackAdded(mock_stream("remote-stream"))).await;

    wait_for_state(&rig.client, ConnectionState::Connected)
        .await
        .unwrap();
    let client = rig.client.clone();
    wait_until("remote stream", move || client.remote_stream().is_some())
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let delivered = streams.lock().unwrap().clone();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].stream_id(), "remote-stream");
    assert_eq!(
        rig.client.remote_stream().map(|s| s.stream_id().to_owned()),
        Some("remote-stream".to_owned())
    );

    assert_eq!(
        recorded.states(),
        vec![ConnectionState::Connecting, ConnectionState::Connected]
    );
    assert_eq!(recorded.paired().len(), 1);
    assert_eq!(recorded.paired()[0].role, NegotiationRole::Initiator);
    assert_eq!(recorded.paired()[0].client_id.as_deref(), Some("client-1"));
    assert!(recorded.errors().is_empty());

    rig.client.disconnect().await.unwrap();
    assert!(rig.client.remote_stream().is_none());
}

#[tokio::test]
async fn test_responder_answers_incoming_offer() {
    init_tracing();

    let mut rig = create_test_client(test_config(DeviceType::Companion));
    let mut relay = rig.joined("ROOM91").await.unwrap();

    relay.send(&status("client-2", Some(true), None)).unwrap();
    relay
        .send(&SignalingMessage::Offer {
            payload: pairlink_core::SessionDescription::offer("v=0 remote-offer"),
        })
        .unwrap();

    let SignalingMessage::Answer { payload } = relay.recv().await.unwrap() else {
        panic!("expected an answer");
    };
    assert_eq!(payload.sdp_type, SdpType::Answer);
    assert_eq!(
        rig.peers.calls().await,
        vec![
            PeerCall::SetRemote(SdpType::Offer, "v=0 remote-offer".into()),
            PeerCall::CreateAnswer,
        ]
    );
    assert_eq!(rig.peers.sessions_created().await, 1);
}
