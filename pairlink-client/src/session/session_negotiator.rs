use crate::error::{ClientError, ClientResult};
use crate::signaling::SignalingOutput;
use crate::transport::{PeerEvent, PeerEventSink, PeerFactory, PeerSession, RemoteStream};
use pairlink_core::{IceCandidate, NegotiationRole, SdpType, SessionDescription, SessionId};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct ActiveSession {
    id: SessionId,
    peer: Arc<dyn PeerSession>,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
}

/// Drives the offer/answer and candidate exchange for the single peer session
/// of a client.
///
/// Remote candidates that arrive before the remote description is applied are
/// queued and flushed, in arrival order, right after it is.
pub struct SessionNegotiator {
    factory: Arc<dyn PeerFactory>,
    peer_events: mpsc::Sender<(SessionId, PeerEvent)>,
    role: Option<NegotiationRole>,
    session: Option<ActiveSession>,
    pending_candidates: VecDeque<IceCandidate>,
    remote_stream: Option<RemoteStream>,
}

impl SessionNegotiator {
    pub fn new(
        factory: Arc<dyn PeerFactory>,
        peer_events: mpsc::Sender<(SessionId, PeerEvent)>,
    ) -> Self {
        Self {
            factory,
            peer_events,
            role: None,
            session: None,
            pending_candidates: VecDeque::new(),
            remote_stream: None,
        }
    }

    pub fn role(&self) -> Option<NegotiationRole> {
        self.role
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// True if `id` names the live peer session; events from older sessions are stale.
    pub fn is_current(&self, id: SessionId) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == id)
    }

    pub fn remote_stream(&self) -> Option<RemoteStream> {
        self.remote_stream.clone()
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// The room is paired. Only the initiator offers, and only once.
    pub async fn on_paired(
        &mut self,
        role: NegotiationRole,
        out: &dyn SignalingOutput,
    ) -> ClientResult<()> {
        self.role = Some(role);

        if role == NegotiationRole::Responder {
            debug!("Paired as responder, waiting for an offer");
            return Ok(());
        }
        if self.session.is_some() {
            debug!("Peer session already exists, not offering again");
            return Ok(());
        }

        let peer = self.create_session().await?;
        let offer = peer.create_offer().await?;
        if let Some(session) = self.session.as_mut() {
            session.local = Some(offer.clone());
        }
        info!("Sending offer");
        out.send_offer(offer)
    }

    pub async fn on_offer(
        &mut self,
        offer: SessionDescription,
        out: &dyn SignalingOutput,
    ) -> ClientResult<()> {
        if offer.sdp_type != SdpType::Offer {
            return Err(ClientError::Negotiation(format!(
                "expected an offer description, got {:?}",
                offer.sdp_type
            )));
        }

        let existing = match &self.session {
            // Both sides offered: neither will ever answer.
            Some(session) if session.local.is_some() && session.remote.is_none() => {
                return Err(ClientError::Negotiation(
                    "received an offer while our own offer is unanswered".into(),
                ));
            }
            Some(session) if session.local.is_some() || session.remote.is_some() => {
                warn!("Ignoring offer: negotiation already in progress");
                return Ok(());
            }
            Some(session) => Some(session.peer.clone()),
            None => None,
        };
        let peer = match existing {
            Some(peer) => peer,
            None => self.create_session().await?,
        };

        peer.set_remote_description(offer.clone()).await?;
        if let Some(session) = self.session.as_mut() {
            session.remote = Some(offer);
        }
        self.flush_candidates().await?;

        let answer = peer.create_answer().await?;
        if let Some(session) = self.session.as_mut() {
            session.local = Some(answer.clone());
        }
        info!("Sending answer");
        out.send_answer(answer)
    }

    pub async fn on_answer(&mut self, answer: SessionDescription) -> ClientResult<()> {
        let Some(session) = self.session.as_mut() else {
            warn!("Ignoring answer: no peer session");
            return Ok(());
        };
        let awaiting_answer = session
            .local
            .as_ref()
            .is_some_and(|local| local.sdp_type == SdpType::Offer)
            && session.remote.is_none();
        if !awaiting_answer {
            warn!("Ignoring answer: no offer is pending");
            return Ok(());
        }

        session.peer.set_remote_description(answer.clone()).await?;
        session.remote = Some(answer);
        debug!("Remote answer applied");
        self.flush_candidates().await
    }

    pub async fn on_remote_candidate(&mut self, candidate: IceCandidate) -> ClientResult<()> {
        match &self.session {
            Some(session) if session.remote.is_some() => {
                session.peer.add_ice_candidate(candidate).await?;
                Ok(())
            }
            _ => {
                debug!("Queueing early remote candidate");
                self.pending_candidates.push_back(candidate);
                Ok(())
            }
        }
    }

    /// Remembers a newly delivered stream. Returns false if it is already known.
    pub fn accept_stream(&mut self, stream: RemoteStream) -> bool {
        if self
            .remote_stream
            .as_ref()
            .is_some_and(|known| known.stream_id() == stream.stream_id())
        {
            return false;
        }
        self.remote_stream = Some(stream);
        true
    }

    /// Closes the peer session and forgets all negotiation state.
    pub async fn teardown(&mut self) {
        self.role = None;
        self.pending_candidates.clear();
        self.remote_stream = None;

        let Some(session) = self.session.take() else {
            return;
        };
        info!("Closing peer session {}", session.id);
        if let Err(e) = session.peer.close().await {
            warn!("Failed to close peer session {}: {:#}", session.id, e);
        }
    }

    async fn create_session(&mut self) -> ClientResult<Arc<dyn PeerSession>> {
        let id = SessionId::new();
        let sink = PeerEventSink::new(id, self.peer_events.clone());
        let peer = self.factory.create(sink).await?;
        info!("Peer session {} created", id);
        self.session = Some(ActiveSession {
            id,
            peer: peer.clone(),
            local: None,
            remote: None,
        });
        Ok(peer)
    }

    async fn flush_candidates(&mut self) -> ClientResult<()> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        if !self.pending_candidates.is_empty() {
            debug!("Applying {} queued candidates", self.pending_candidates.len());
        }
        while let Some(candidate) = self.pending_candidates.pop_front() {
            session.peer.add_ice_candidate(candidate).await?;
        }
        Ok(())
    }
}
