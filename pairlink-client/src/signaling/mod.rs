mod connector;
mod signaling_channel;
mod signaling_output;
mod ws_connector;

pub use connector::*;
pub use signaling_channel::*;
pub use signaling_output::*;
pub use ws_connector::*;
