mod peer;
mod room;
mod signaling;
mod state;

pub use peer::{AttemptId, DeviceType, NegotiationRole, SessionId};
pub use room::{CreateRoomResponse, RoomCode};
pub use signaling::{IceCandidate, IceServerConfig, SdpType, SessionDescription, SignalingMessage};
pub use state::ConnectionState;
