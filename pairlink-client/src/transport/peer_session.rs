use crate::transport::transport_event::PeerEventSink;
use anyhow::Result;
use async_trait::async_trait;
use pairlink_core::{IceCandidate, SessionDescription};
use std::fmt;
use std::sync::Arc;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::track::track_remote::TrackRemote;

/// Connectivity state reported by the media platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl From<RTCPeerConnectionState> for PeerState {
    fn from(s: RTCPeerConnectionState) -> Self {
        match s {
            RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => PeerState::New,
            RTCPeerConnectionState::Connecting => PeerState::Connecting,
            RTCPeerConnectionState::Connected => PeerState::Connected,
            RTCPeerConnectionState::Disconnected => PeerState::Disconnected,
            RTCPeerConnectionState::Failed => PeerState::Failed,
            RTCPeerConnectionState::Closed => PeerState::Closed,
        }
    }
}

/// A remote media track delivered by a peer session.
pub trait RemoteTrack: Send + Sync {
    fn id(&self) -> String;

    fn stream_id(&self) -> String;

    /// The RTP track when the session is backed by `webrtc`.
    fn rtp_track(&self) -> Option<Arc<TrackRemote>> {
        None
    }
}

/// Handle to the remote audio stream exposed to callers.
#[derive(Clone)]
pub struct RemoteStream {
    stream_id: String,
    track: Arc<dyn RemoteTrack>,
}

impl RemoteStream {
    pub fn new(track: Arc<dyn RemoteTrack>) -> Self {
        Self {
            stream_id: track.stream_id(),
            track,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn track_id(&self) -> String {
        self.track.id()
    }

    pub fn track(&self) -> &Arc<dyn RemoteTrack> {
        &self.track
    }
}

impl PartialEq for RemoteStream {
    fn eq(&self, other: &Self) -> bool {
        self.stream_id == other.stream_id && Arc::ptr_eq(&self.track, &other.track)
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream")
            .field("stream_id", &self.stream_id)
            .field("track_id", &self.track.id())
            .finish()
    }
}

/// The negotiated peer-to-peer session.
///
/// `create_offer` and `create_answer` also install the produced description
/// as the local description.
#[async_trait]
pub trait PeerSession: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Creates peer sessions; events of the new session go through `sink`.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create(&self, sink: PeerEventSink) -> Result<Arc<dyn PeerSession>>;
}
