pub use pairlink_core::model::{ConnectionState, DeviceType, RoomCode};

pub mod model {
    pub use pairlink_core::model::*;
    pub use pairlink_core::utils;
}

#[cfg(feature = "client")]
pub mod client {
    pub use pairlink_client::*;
}
