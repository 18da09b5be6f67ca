/// Public STUN servers used when no ICE servers are configured.
pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Relay endpoint used to allocate a new room code.
pub const CREATE_ROOM_PATH: &str = "/create-room";
