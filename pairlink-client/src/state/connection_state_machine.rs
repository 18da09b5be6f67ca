use crate::error::ClientError;
use crate::events::{ConnectionStateChange, EventBus};
use pairlink_core::ConnectionState;
use tokio::sync::watch;
use tracing::{debug, info};

/// Owns the aggregate [`ConnectionState`]; every change goes through here.
pub struct ConnectionStateMachine {
    state: ConnectionState,
    published: watch::Sender<ConnectionState>,
    events: EventBus,
}

impl ConnectionStateMachine {
    pub fn new(events: EventBus) -> (Self, watch::Receiver<ConnectionState>) {
        let (published, rx) = watch::channel(ConnectionState::Disconnected);
        let machine = Self {
            state: ConnectionState::Disconnected,
            published,
            events,
        };
        (machine, rx)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Moves forward within the current attempt.
    ///
    /// Returns `Ok(false)` when already in `next`; nothing is announced then.
    pub fn transition(&mut self, next: ConnectionState) -> Result<bool, ClientError> {
        if self.state == next {
            return Ok(false);
        }
        if !self.state.can_advance_to(next) {
            debug!("Rejected transition {} -> {}", self.state, next);
            return Err(ClientError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.apply(next);
        Ok(true)
    }

    /// Teardown path: any state may return to `Disconnected`.
    pub fn reset(&mut self) -> bool {
        if self.state == ConnectionState::Disconnected {
            return false;
        }
        self.apply(ConnectionState::Disconnected);
        true
    }

    fn apply(&mut self, next: ConnectionState) {
        info!("Connection state {} -> {}", self.state, next);
        self.state = next;
        self.published.send_replace(next);
        self.events.emit::<ConnectionStateChange>(&next);
    }
}
