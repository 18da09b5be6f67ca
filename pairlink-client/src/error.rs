//! Error types for the pairing client.

use pairlink_core::{ConnectionState, RoomCode};
use thiserror::Error;

/// Failures surfaced by [`PairingClient`](crate::PairingClient) calls and on the `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Relay unreachable, channel failed to open, or closed unexpectedly.
    #[error("transport error: {0}")]
    Transport(String),

    /// Relay sent an explicit `error` message.
    #[error("relay reported an error: {0}")]
    Protocol(String),

    /// Applying a session description or candidate failed.
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    /// Join confirmation did not arrive in time.
    #[error("no join confirmation within {0} ms")]
    Timeout(u64),

    /// Operation not allowed in the current connection state.
    #[error("operation not allowed while {0}")]
    InvalidState(ConnectionState),

    /// Room codes are single-use.
    #[error("room code {0} was already used")]
    RoomCodeReused(RoomCode),

    /// Pending operation was cancelled by `disconnect()`.
    #[error("cancelled by disconnect")]
    Cancelled,

    #[error("invalid state transition {from} -> {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// The coordinator task is gone.
    #[error("client is shut down")]
    Closed,
}

impl ClientError {
    /// Returns true if a fresh `connect()` with a new room code may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_)
                | ClientError::Protocol(_)
                | ClientError::Negotiation(_)
                | ClientError::Timeout(_)
                | ClientError::Cancelled
        )
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        ClientError::Negotiation(format!("{err:#}"))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
