mod connection_state_machine;

pub use connection_state_machine::*;
