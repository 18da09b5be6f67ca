use pairlink_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use pairlink_core::{DeviceType, IceServerConfig, RoomCode};
use std::time::Duration;

pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(45);

/// Heartbeat on the signaling channel. Off unless configured, since relays are not
/// required to answer `ping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveConfig {
    /// Delay between outgoing `ping` messages.
    pub interval: Duration,
    /// Once the relay has answered a `ping`, the channel is considered stalled after
    /// this long without any inbound frame.
    pub timeout: Duration,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_KEEPALIVE_INTERVAL,
            timeout: DEFAULT_KEEPALIVE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub device_type: DeviceType,
    pub join_timeout: Duration,
    pub keepalive: Option<KeepaliveConfig>,
    pub ice_servers: Vec<IceServerConfig>,
    pub command_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Primary,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            keepalive: None,
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
                username: None,
                credential: None,
            }],
            command_buffer: 64,
        }
    }
}

impl ClientConfig {
    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    pub fn with_keepalive(mut self, keepalive: Option<KeepaliveConfig>) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = ice_servers;
        self
    }
}

/// Arguments of [`PairingClient::connect`](crate::PairingClient::connect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub service_address: String,
    pub room_code: RoomCode,
}

impl ConnectRequest {
    pub fn new(service_address: impl Into<String>, room_code: impl Into<RoomCode>) -> Self {
        Self {
            service_address: service_address.into(),
            room_code: room_code.into(),
        }
    }
}
