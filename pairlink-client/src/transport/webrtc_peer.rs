use crate::transport::peer_session::{
    PeerFactory, PeerSession, PeerState, RemoteStream, RemoteTrack,
};
use crate::transport::transport_event::{PeerEvent, PeerEventSink};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use pairlink_core::{IceCandidate, IceServerConfig, SdpType, SessionDescription, SessionId};
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds peer sessions on the `webrtc` stack.
#[derive(Clone, Default)]
pub struct WebRtcPeerFactory {
    ice_servers: Vec<IceServerConfig>,
    local_audio: Option<Arc<dyn TrackLocal + Send + Sync>>,
}

impl WebRtcPeerFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            ice_servers,
            local_audio: None,
        }
    }

    /// Sends this track to the remote side instead of negotiating receive-only audio.
    pub fn with_local_audio(mut self, track: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        self.local_audio = Some(track);
        self
    }
}

#[async_trait]
impl PeerFactory for WebRtcPeerFactory {
    async fn create(&self, sink: PeerEventSink) -> Result<Arc<dyn PeerSession>> {
        let session =
            WebRtcPeerSession::new(&self.ice_servers, self.local_audio.clone(), sink).await?;
        Ok(Arc::new(session))
    }
}

pub struct WebRtcPeerSession {
    pub session_id: SessionId,
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcPeerSession {
    pub async fn new(
        ice_servers: &[IceServerConfig],
        local_audio: Option<Arc<dyn TrackLocal + Send + Sync>>,
        sink: PeerEventSink,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        match local_audio {
            Some(track) => {
                let sender = peer_connection
                    .add_track(track)
                    .await
                    .context("Failed to add local audio track")?;
                // RTCP has to be drained for the interceptors to work.
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 1500];
                    while sender.read(&mut buf).await.is_ok() {}
                });
            }
            None => {
                peer_connection
                    .add_transceiver_from_kind(
                        RTPCodecType::Audio,
                        Some(RTCRtpTransceiverInit {
                            direction: RTCRtpTransceiverDirection::Recvonly,
                            send_encodings: vec![],
                        }),
                    )
                    .await
                    .context("Failed to add audio transceiver")?;
            }
        }

        let session_id = sink.session_id();

        let state_sink = sink.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let sink = state_sink.clone();
                Box::pin(async move {
                    info!("Peer connection state for session {}: {:?}", session_id, s);
                    sink.send(PeerEvent::StateChanged(PeerState::from(s))).await;
                })
            },
        ));

        let ice_sink = sink.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let sink = ice_sink.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_m_line_index: init.sdp_mline_index,
                    sdp_mid: init.sdp_mid,
                };
                sink.send(PeerEvent::CandidateGenerated(candidate)).await;
            })
        }));

        let track_sink = sink;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let sink = track_sink.clone();
                Box::pin(async move {
                    if track.kind() != RTPCodecType::Audio {
                        debug!("Ignoring non-audio track {}", track.id());
                        return;
                    }
                    info!(
                        "Remote audio track {} on stream {}",
                        track.id(),
                        track.stream_id()
                    );
                    let stream = RemoteStream::new(Arc::new(WebRtcRemoteTrack(track)));
                    sink.send(PeerEvent::TrackAdded(stream)).await;
                })
            },
        ));

        Ok(Self {
            session_id,
            peer_connection,
        })
    }
}

#[async_trait]
impl PeerSession for WebRtcPeerSession {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .context("Failed to set local offer")?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("Failed to set local answer")?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = match description.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(description.sdp)?,
            SdpType::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
            SdpType::Rollback => bail!("Rollback descriptions are not supported"),
        };
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

struct WebRtcRemoteTrack(Arc<TrackRemote>);

impl RemoteTrack for WebRtcRemoteTrack {
    fn id(&self) -> String {
        self.0.id()
    }

    fn stream_id(&self) -> String {
        self.0.stream_id()
    }

    fn rtp_track(&self) -> Option<Arc<TrackRemote>> {
        Some(self.0.clone())
    }
}
