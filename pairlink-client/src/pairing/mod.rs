mod client_command;
mod pairing_client;
mod pairing_coordinator;
mod room_api;

pub(crate) use client_command::*;
pub use pairing_client::*;
pub(crate) use pairing_coordinator::*;
pub use room_api::*;
