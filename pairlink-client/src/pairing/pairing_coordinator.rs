use crate::config::{ClientConfig, ConnectRequest};
use crate::error::{ClientError, ClientResult};
use crate::events::{ErrorEvent, EventBus, Paired, PairedInfo, RemoteAudioStream};
use crate::pairing::client_command::ClientCommand;
use crate::session::SessionNegotiator;
use crate::signaling::{
    ChannelEvent, FramePipe, SignalingChannel, SignalingConnector, SignalingOutput,
};
use crate::state::ConnectionStateMachine;
use crate::transport::{PeerEvent, PeerFactory, PeerState, RemoteStream};
use pairlink_core::{
    AttemptId, ConnectionState, NegotiationRole, RoomCode, SessionId, SignalingMessage,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

const INTERNAL_BUFFER: usize = 256;

struct PendingJoin {
    reply: oneshot::Sender<ClientResult<()>>,
    deadline: Instant,
}

/// One `connect()` call, from dialing the relay until teardown.
struct Attempt {
    id: AttemptId,
    room_code: RoomCode,
    channel: Option<SignalingChannel>,
    pending: Option<PendingJoin>,
    paired: bool,
}

/// Receivers a [`PairingClient`](crate::PairingClient) keeps to observe the coordinator.
pub(crate) struct CoordinatorHandles {
    pub state: watch::Receiver<ConnectionState>,
    pub remote_stream: watch::Receiver<Option<RemoteStream>>,
}

/// Owns every piece of per-client state and processes commands, channel
/// messages, peer events and the join deadline one at a time.
pub(crate) struct PairingCoordinator {
    config: ClientConfig,
    connector: Arc<dyn SignalingConnector>,
    events: EventBus,
    state: ConnectionStateMachine,
    negotiator: SessionNegotiator,
    stream_tx: watch::Sender<Option<RemoteStream>>,
    used_rooms: HashSet<RoomCode>,
    attempt: Option<Attempt>,
    command_rx: mpsc::Receiver<ClientCommand>,
    dial_tx: mpsc::Sender<(AttemptId, ClientResult<FramePipe>)>,
    dial_rx: mpsc::Receiver<(AttemptId, ClientResult<FramePipe>)>,
    channel_tx: mpsc::Sender<(AttemptId, ChannelEvent)>,
    channel_rx: mpsc::Receiver<(AttemptId, ChannelEvent)>,
    peer_rx: mpsc::Receiver<(SessionId, PeerEvent)>,
}

impl PairingCoordinator {
    pub(crate) fn new(
        config: ClientConfig,
        connector: Arc<dyn SignalingConnector>,
        peers: Arc<dyn PeerFactory>,
        events: EventBus,
        command_rx: mpsc::Receiver<ClientCommand>,
    ) -> (Self, CoordinatorHandles) {
        let (state, state_rx) = ConnectionStateMachine::new(events.clone());
        let (stream_tx, stream_rx) = watch::channel(None);
        let (dial_tx, dial_rx) = mpsc::channel(INTERNAL_BUFFER);
        let (channel_tx, channel_rx) = mpsc::channel(INTERNAL_BUFFER);
        let (peer_tx, peer_rx) = mpsc::channel(INTERNAL_BUFFER);

        let coordinator = Self {
            config,
            connector,
            events,
            state,
            negotiator: SessionNegotiator::new(peers, peer_tx),
            stream_tx,
            used_rooms: HashSet::new(),
            attempt: None,
            command_rx,
            dial_tx,
            dial_rx,
            channel_tx,
            channel_rx,
            peer_rx,
        };
        let handles = CoordinatorHandles {
            state: state_rx,
            remote_stream: stream_rx,
        };
        (coordinator, handles)
    }

    pub async fn run(mut self) {
        info!("Pairing coordinator started");

        loop {
            let deadline = self
                .attempt
                .as_ref()
                .and_then(|a| a.pending.as_ref())
                .map(|p| p.deadline);

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All client handles dropped. Shutting down coordinator.");
                            break;
                        }
                    }
                }

                Some((id, dialed)) = self.dial_rx.recv() => {
                    self.handle_dialed(id, dialed).await;
                }

                Some((id, event)) = self.channel_rx.recv() => {
                    self.handle_channel_event(id, event).await;
                }

                Some((id, event)) = self.peer_rx.recv() => {
                    self.handle_peer_event(id, event).await;
                }

                _ = join_deadline(deadline) => {
                    let ms = self.config.join_timeout.as_millis() as u64;
                    warn!("No join confirmation within {} ms", ms);
                    self.fail_attempt(ClientError::Timeout(ms)).await;
                }
            }
        }

        self.teardown(ClientError::Closed).await;
        info!("Pairing coordinator finished");
    }

    async fn handle_command(&mut self, cmd: ClientCommand) {
        match cmd {
            ClientCommand::Connect { request, reply } => {
                if let Err(e) = self.start_attempt(request, reply).await {
                    debug!("Connect rejected: {}", e);
                }
            }

            ClientCommand::Disconnect { reply } => {
                if let Some(attempt) = &self.attempt {
                    self.used_rooms.insert(attempt.room_code.clone());
                }
                self.teardown(ClientError::Cancelled).await;
                let _ = reply.send(());
            }
        }
    }

    /// Validates the request and starts dialing. The reply is answered here on
    /// rejection, otherwise once the join is confirmed or the attempt fails.
    async fn start_attempt(
        &mut self,
        request: ConnectRequest,
        reply: oneshot::Sender<ClientResult<()>>,
    ) -> ClientResult<()> {
        let current = self.state.state();
        let rejection = match current {
            ConnectionState::Connecting | ConnectionState::Connected => {
                Some(ClientError::InvalidState(current))
            }
            _ if self.used_rooms.contains(&request.room_code) => {
                Some(ClientError::RoomCodeReused(request.room_code.clone()))
            }
            _ => None,
        };
        if let Some(err) = rejection {
            let _ = reply.send(Err(err.clone()));
            return Err(err);
        }

        if current == ConnectionState::Error {
            self.teardown(ClientError::Cancelled).await;
        }
        if let Err(err) = self.state.transition(ConnectionState::Connecting) {
            let _ = reply.send(Err(err.clone()));
            return Err(err);
        }

        let id = AttemptId::new();
        info!(
            "Attempt {}: joining room {} at {} as {}",
            id, request.room_code, request.service_address, self.config.device_type
        );

        let connector = self.connector.clone();
        let dial_tx = self.dial_tx.clone();
        let address = request.service_address.clone();
        tokio::spawn(async move {
            let dialed = connector.connect(&address).await;
            let _ = dial_tx.send((id, dialed)).await;
        });

        self.attempt = Some(Attempt {
            id,
            room_code: request.room_code,
            channel: None,
            pending: Some(PendingJoin {
                reply,
                deadline: Instant::now() + self.config.join_timeout,
            }),
            paired: false,
        });
        Ok(())
    }

    async fn handle_dialed(&mut self, id: AttemptId, dialed: ClientResult<FramePipe>) {
        let Some(attempt) = self.attempt.as_mut().filter(|a| a.id == id) else {
            debug!("Dropping connection of stale attempt {}", id);
            return;
        };

        let pipe = match dialed {
            Ok(pipe) => pipe,
            Err(e) => {
                self.fail_attempt(e).await;
                return;
            }
        };

        let channel = SignalingChannel::open(
            id,
            pipe,
            self.config.keepalive,
            self.channel_tx.clone(),
        );
        let join = SignalingMessage::Join {
            room_code: attempt.room_code.clone(),
            device_type: self.config.device_type,
        };
        let sent = channel.send(&join);
        attempt.channel = Some(channel);

        match sent {
            Ok(()) => {
                self.used_rooms.insert(attempt.room_code.clone());
                debug!("Join sent for room {}", attempt.room_code);
            }
            Err(e) => self.fail_attempt(e).await,
        }
    }

    async fn handle_channel_event(&mut self, id: AttemptId, event: ChannelEvent) {
        if !self.attempt.as_ref().is_some_and(|a| a.id == id) {
            debug!("Dropping channel event of stale attempt {}", id);
            return;
        }

        match event {
            ChannelEvent::Message(msg) => self.handle_signal(msg).await,

            ChannelEvent::Closed(reason) => {
                let err = ClientError::Transport(format!("signaling channel closed: {reason:?}"));
                error!("{}", err);
                self.events.emit::<ErrorEvent>(&err);
                self.teardown(err).await;
            }
        }
    }

    async fn handle_signal(&mut self, msg: SignalingMessage) {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };

        let outcome = match msg {
            SignalingMessage::Status {
                client_id,
                paired,
                initiator,
            } => {
                if let Some(pending) = attempt.pending.take() {
                    info!("Joined room {} as {:?}", attempt.room_code, client_id);
                    let _ = pending.reply.send(Ok(()));
                }
                if paired != Some(true) || attempt.paired {
                    return;
                }
                attempt.paired = true;

                let role = NegotiationRole::resolve(initiator, self.config.device_type);
                info!("Room {} paired, negotiating as {:?}", attempt.room_code, role);
                self.events.emit::<Paired>(&PairedInfo { client_id, role });

                let Some(channel) = self.attempt.as_ref().and_then(|a| a.channel.as_ref()) else {
                    return;
                };
                self.negotiator.on_paired(role, channel).await
            }

            SignalingMessage::Offer { payload } => {
                let Some(channel) = attempt.channel.as_ref() else {
                    return;
                };
                self.negotiator.on_offer(payload, channel).await
            }

            SignalingMessage::Answer { payload } => self.negotiator.on_answer(payload).await,

            SignalingMessage::IceCandidate { payload } => {
                self.negotiator.on_remote_candidate(payload).await
            }

            SignalingMessage::Error { error } => Err(ClientError::Protocol(error)),

            other => {
                debug!("Ignoring unexpected {} message", other.tag());
                Ok(())
            }
        };

        if let Err(e) = outcome {
            self.fail_attempt(e).await;
        }
    }

    async fn handle_peer_event(&mut self, id: SessionId, event: PeerEvent) {
        if !self.negotiator.is_current(id) {
            debug!("Dropping event of stale peer session {}", id);
            return;
        }

        match event {
            PeerEvent::CandidateGenerated(candidate) => {
                let Some(channel) = self.attempt.as_ref().and_then(|a| a.channel.as_ref()) else {
                    return;
                };
                if let Err(e) = channel.send_ice(candidate) {
                    warn!("Failed to send local candidate: {}", e);
                }
            }

            PeerEvent::StateChanged(PeerState::Connected) => {
                if let Some(pending) = self.attempt.as_mut().and_then(|a| a.pending.take()) {
                    let _ = pending.reply.send(Ok(()));
                }
                if let Err(e) = self.state.transition(ConnectionState::Connected) {
                    warn!("Ignoring peer connection: {}", e);
                }
            }

            PeerEvent::StateChanged(PeerState::Failed) => {
                let err = ClientError::Negotiation("peer connection failed".into());
                error!("{}", err);
                self.events.emit::<ErrorEvent>(&err);
                self.teardown(err).await;
            }

            PeerEvent::StateChanged(s @ (PeerState::Disconnected | PeerState::Closed)) => {
                let err = ClientError::Transport(format!("peer connection lost: {s:?}"));
                warn!("{}, tearing down", err);
                self.events.emit::<ErrorEvent>(&err);
                self.teardown(err).await;
            }

            PeerEvent::StateChanged(s) => debug!("Peer connection {:?}", s),

            PeerEvent::TrackAdded(stream) => {
                if !self.negotiator.accept_stream(stream.clone()) {
                    debug!("Stream {} already delivered", stream.stream_id());
                    return;
                }
                info!("Remote audio stream {} available", stream.stream_id());
                self.stream_tx.send_replace(Some(stream.clone()));
                self.events.emit::<RemoteAudioStream>(&stream);
            }
        }
    }

    /// Terminal failure of the current attempt: everything is closed, state is
    /// `ERROR`, and the failure goes to the `error` event and to a pending `connect()`.
    async fn fail_attempt(&mut self, err: ClientError) {
        error!("Connection attempt failed: {}", err);

        let pending = self.close_attempt().await;
        if let Err(e) = self.state.transition(ConnectionState::Error) {
            debug!("Not entering ERROR: {}", e);
        }
        self.events.emit::<ErrorEvent>(&err);
        if let Some(pending) = pending {
            let _ = pending.reply.send(Err(err));
        }
    }

    /// Closes everything and returns to `DISCONNECTED`. A pending `connect()`
    /// is rejected with `err`.
    async fn teardown(&mut self, err: ClientError) {
        let pending = self.close_attempt().await;
        self.state.reset();
        if let Some(pending) = pending {
            let _ = pending.reply.send(Err(err));
        }
    }

    async fn close_attempt(&mut self) -> Option<PendingJoin> {
        self.negotiator.teardown().await;
        if self.stream_tx.borrow().is_some() {
            self.stream_tx.send_replace(None);
        }

        let mut attempt = self.attempt.take()?;
        if let Some(channel) = attempt.channel.as_mut() {
            channel.close();
        }
        debug!("Attempt {} closed", attempt.id);
        attempt.pending.take()
    }
}

async fn join_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
