use crate::config::ConnectRequest;
use crate::error::ClientResult;
use tokio::sync::oneshot;

/// Requests from [`PairingClient`](crate::PairingClient) handles to the coordinator task.
#[derive(Debug)]
pub(crate) enum ClientCommand {
    Connect {
        request: ConnectRequest,
        reply: oneshot::Sender<ClientResult<()>>,
    },

    Disconnect { reply: oneshot::Sender<()> },
}
