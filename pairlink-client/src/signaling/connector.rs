use crate::error::ClientResult;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Text frames to and from the relay.
///
/// Dropping `outgoing` closes the connection; `incoming` yields `None` once the
/// remote side is gone.
#[derive(Debug)]
pub struct FramePipe {
    pub outgoing: mpsc::UnboundedSender<String>,
    pub incoming: mpsc::UnboundedReceiver<String>,
}

impl FramePipe {
    /// Two cross-wired ends: frames sent on one arrive on the other.
    pub fn pair() -> (FramePipe, FramePipe) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            FramePipe {
                outgoing: a_tx,
                incoming: b_rx,
            },
            FramePipe {
                outgoing: b_tx,
                incoming: a_rx,
            },
        )
    }
}

/// Opens the persistent message connection to the relay service.
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    async fn connect(&self, service_address: &str) -> ClientResult<FramePipe>;
}
