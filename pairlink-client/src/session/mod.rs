mod session_negotiator;

pub use session_negotiator::*;
