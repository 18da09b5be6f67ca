use crate::config::{ClientConfig, ConnectRequest};
use crate::error::{ClientError, ClientResult};
use crate::events::{EventBus, EventKind, ListenerId};
use crate::pairing::client_command::ClientCommand;
use crate::pairing::pairing_coordinator::PairingCoordinator;
use crate::pairing::room_api;
use crate::signaling::{SignalingConnector, WebSocketConnector};
use crate::transport::{PeerFactory, RemoteStream, WebRtcPeerFactory};
use pairlink_core::{ConnectionState, RoomCode};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Handle to one pairing client.
///
/// Every [`PairingClient::new`] spawns its own coordinator task; clones share it.
/// The task shuts down and tears the connection down once the last clone is dropped.
/// Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct PairingClient {
    commands: mpsc::Sender<ClientCommand>,
    events: EventBus,
    state: watch::Receiver<ConnectionState>,
    remote_stream: watch::Receiver<Option<RemoteStream>>,
    http: reqwest::Client,
}

impl PairingClient {
    pub fn new(
        config: ClientConfig,
        connector: Arc<dyn SignalingConnector>,
        peers: Arc<dyn PeerFactory>,
    ) -> Self {
        let (commands, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let events = EventBus::new();
        let (coordinator, handles) =
            PairingCoordinator::new(config, connector, peers, events.clone(), command_rx);
        tokio::spawn(coordinator.run());

        Self {
            commands,
            events,
            state: handles.state,
            remote_stream: handles.remote_stream,
            http: reqwest::Client::new(),
        }
    }

    /// Websocket signaling and `webrtc` peer sessions.
    pub fn with_defaults(config: ClientConfig) -> Self {
        let peers = WebRtcPeerFactory::new(config.ice_servers.clone());
        Self::new(config, Arc::new(WebSocketConnector), Arc::new(peers))
    }

    pub async fn create_room(&self, service_address: &str) -> ClientResult<RoomCode> {
        room_api::create_room(&self.http, service_address).await
    }

    /// Joins `request.room_code` and resolves once the relay confirms the join.
    pub async fn connect(&self, request: ConnectRequest) -> ClientResult<()> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(ClientCommand::Connect { request, reply })
            .await
            .map_err(|_| ClientError::Closed)?;
        rx.await.map_err(|_| ClientError::Closed)?
    }

    /// Idempotent; always leaves the client `DISCONNECTED`.
    pub async fn disconnect(&self) -> ClientResult<()> {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(ClientCommand::Disconnect { reply })
            .await
            .is_err()
        {
            return Ok(());
        }
        let _ = rx.await;
        Ok(())
    }

    pub fn remote_stream(&self) -> Option<RemoteStream> {
        self.remote_stream.borrow().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn on<E, F>(&self, handler: F) -> ListenerId
    where
        E: EventKind,
        F: Fn(&E::Payload) + Send + Sync + 'static,
    {
        self.events.on::<E, F>(handler)
    }

    pub fn off(&self, listener: ListenerId) -> bool {
        self.events.off(listener)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
