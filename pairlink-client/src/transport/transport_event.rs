use crate::transport::peer_session::{PeerState, RemoteStream};
use pairlink_core::{IceCandidate, SessionId};
use tokio::sync::mpsc;

/// Events a peer session reports back to the coordinator.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// Local connectivity candidate discovered; forward it to the remote side.
    CandidateGenerated(IceCandidate),

    /// Underlying connectivity state changed.
    StateChanged(PeerState),

    /// Remote audio became available.
    TrackAdded(RemoteStream),
}

/// Handed to a peer session at creation; tags every event with the session id.
#[derive(Debug, Clone)]
pub struct PeerEventSink {
    session: SessionId,
    tx: mpsc::Sender<(SessionId, PeerEvent)>,
}

impl PeerEventSink {
    pub fn new(session: SessionId, tx: mpsc::Sender<(SessionId, PeerEvent)>) -> Self {
        Self { session, tx }
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    /// Returns false once the coordinator has gone away.
    pub async fn send(&self, event: PeerEvent) -> bool {
        self.tx.send((self.session, event)).await.is_ok()
    }
}
