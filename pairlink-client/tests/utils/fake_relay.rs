use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use pairlink_client::{ClientError, ClientResult, FramePipe, SignalingConnector};
use pairlink_core::SignalingMessage;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::timeout;

use super::signal_helpers::SIGNAL_TIMEOUT_MS;

/// Relay side of one signaling connection opened by the client under test.
pub struct RelayEnd {
    pub address: String,
    pipe: FramePipe,
}

impl RelayEnd {
    /// Next message sent by the client.
    pub async fn recv(&mut self) -> Result<SignalingMessage> {
        let frame = timeout(
            Duration::from_millis(SIGNAL_TIMEOUT_MS),
            self.pipe.incoming.recv(),
        )
        .await
        .context("Timed out waiting for a client message")?
        .context("Client closed the signaling channel")?;
        serde_json::from_str(&frame).context("Client sent malformed JSON")
    }

    pub fn send(&self, msg: &SignalingMessage) -> Result<()> {
        self.send_raw(serde_json::to_string(msg)?)
    }

    pub fn send_raw(&self, frame: impl Into<String>) -> Result<()> {
        self.pipe
            .outgoing
            .send(frame.into())
            .context("Client side of the channel is gone")
    }

    /// Resolves once the client has closed the channel.
    pub async fn wait_closed(&mut self) -> Result<()> {
        let closed = timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), async {
            while self.pipe.incoming.recv().await.is_some() {}
        })
        .await;
        if closed.is_err() {
            bail!("Client kept the signaling channel open");
        }
        Ok(())
    }

    /// True if the client has not closed its side yet.
    pub fn is_open(&self) -> bool {
        !self.pipe.outgoing.is_closed()
    }

    /// Drops the relay side, as a relay crash would.
    pub fn close(self) {}
}

/// In-memory relay: every `connect` hands the relay end to the test.
pub struct FakeConnector {
    relays: mpsc::UnboundedSender<RelayEnd>,
    failures: AtomicUsize,
    addresses: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<RelayEnd>) {
        let (relays, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            relays,
            failures: AtomicUsize::new(0),
            addresses: Mutex::new(Vec::new()),
        });
        (connector, rx)
    }

    /// Makes the next `count` connection attempts fail.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub async fn addresses(&self) -> Vec<String> {
        self.addresses.lock().await.clone()
    }
}

#[async_trait]
impl SignalingConnector for FakeConnector {
    async fn connect(&self, service_address: &str) -> ClientResult<FramePipe> {
        self.addresses.lock().await.push(service_address.to_owned());

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            tracing::debug!("[FakeConnector] refusing connection to {}", service_address);
            return Err(ClientError::Transport("connection refused".into()));
        }

        let (client, relay) = FramePipe::pair();
        let _ = self.relays.send(RelayEnd {
            address: service_address.to_owned(),
            pipe: relay,
        });
        Ok(client)
    }
}

/// Waits for the client to open its next signaling connection.
pub async fn next_relay(relays: &mut mpsc::UnboundedReceiver<RelayEnd>) -> Result<RelayEnd> {
    timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), relays.recv())
        .await
        .context("Timed out waiting for the client to connect")?
        .context("Connector dropped")
}
