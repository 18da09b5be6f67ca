mod peer_session;
mod transport_event;
mod webrtc_peer;

pub use peer_session::*;
pub use transport_event::*;
pub use webrtc_peer::*;
