//! Pairs this instance with a companion device through a relay service and
//! negotiates a direct peer-to-peer audio session with it.

pub mod config;
pub mod error;
pub mod events;
pub mod pairing;
pub mod session;
pub mod signaling;
pub mod state;
pub mod transport;

pub use config::*;
pub use error::{ClientError, ClientResult};
pub use events::{
    ConnectionStateChange, ErrorEvent, EventBus, EventKind, EventName, ListenerId, Paired,
    PairedInfo, RemoteAudioStream,
};
pub use pairing::{PairingClient, create_room};
pub use signaling::{FramePipe, SignalingConnector, WebSocketConnector};
pub use transport::{
    PeerEvent, PeerEventSink, PeerFactory, PeerSession, PeerState, RemoteStream, RemoteTrack,
    WebRtcPeerFactory,
};
