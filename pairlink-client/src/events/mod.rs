mod event_bus;
mod listeners;

pub use event_bus::*;
pub use listeners::*;
