use crate::config::KeepaliveConfig;
use crate::error::{ClientError, ClientResult};
use crate::signaling::connector::FramePipe;
use crate::signaling::signaling_output::SignalingOutput;
use pairlink_core::{AttemptId, SignalingMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The relay side went away.
    Remote,
    /// Nothing arrived within the keepalive timeout.
    Stalled,
}

/// What the channel reports to its owner, tagged with the attempt it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Message(SignalingMessage),
    Closed(CloseReason),
}

/// Transport and framing for one connection attempt.
///
/// Incoming frames are parsed and forwarded one at a time in arrival order.
/// `ping` is answered and `pong` is consumed here; everything else goes to the owner.
/// With keepalive enabled, silence is only treated as a stall after the relay has
/// answered at least one `ping`.
pub struct SignalingChannel {
    attempt: AttemptId,
    outgoing: Option<mpsc::UnboundedSender<String>>,
    reader: JoinHandle<()>,
}

impl SignalingChannel {
    pub fn open(
        attempt: AttemptId,
        pipe: FramePipe,
        keepalive: Option<KeepaliveConfig>,
        events: mpsc::Sender<(AttemptId, ChannelEvent)>,
    ) -> Self {
        let FramePipe { outgoing, incoming } = pipe;
        let reader = tokio::spawn(read_loop(
            attempt,
            incoming,
            outgoing.downgrade(),
            keepalive,
            events,
        ));
        debug!("Signaling channel opened for attempt {}", attempt);

        Self {
            attempt,
            outgoing: Some(outgoing),
            reader,
        }
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn is_open(&self) -> bool {
        self.outgoing.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn send(&self, msg: &SignalingMessage) -> ClientResult<()> {
        let Some(outgoing) = &self.outgoing else {
            return Err(ClientError::Transport("signaling channel is closed".into()));
        };
        let json = serde_json::to_string(msg)
            .map_err(|e| ClientError::Protocol(format!("failed to encode {}: {e}", msg.tag())))?;
        outgoing
            .send(json)
            .map_err(|_| ClientError::Transport("signaling channel is closed".into()))
    }

    /// Closes the connection. No events are reported for this attempt afterwards.
    pub fn close(&mut self) {
        if self.outgoing.take().is_some() {
            info!("Closing signaling channel for attempt {}", self.attempt);
        }
        self.reader.abort();
    }
}

impl SignalingOutput for SignalingChannel {
    fn send_signal(&self, msg: SignalingMessage) -> ClientResult<()> {
        self.send(&msg)
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    attempt: AttemptId,
    mut incoming: mpsc::UnboundedReceiver<String>,
    outgoing: mpsc::WeakUnboundedSender<String>,
    keepalive: Option<KeepaliveConfig>,
    events: mpsc::Sender<(AttemptId, ChannelEvent)>,
) {
    let mut ticker = keepalive.map(|k| {
        let mut ticker = interval_at(Instant::now() + k.interval, k.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });
    let mut last_inbound = Instant::now();
    let mut relay_answers_pings = false;

    let reason = loop {
        tokio::select! {
            frame = incoming.recv() => {
                let Some(frame) = frame else {
                    break CloseReason::Remote;
                };
                last_inbound = Instant::now();

                match serde_json::from_str::<SignalingMessage>(&frame) {
                    Ok(SignalingMessage::Ping) => {
                        if !send_frame(&outgoing, &SignalingMessage::Pong) {
                            return;
                        }
                    }
                    Ok(SignalingMessage::Pong) => relay_answers_pings = true,
                    Ok(msg) => {
                        debug!("Signaling message received: {}", msg.tag());
                        if events.send((attempt, ChannelEvent::Message(msg))).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!("Dropping malformed signaling frame: {}", e),
                }
            }

            _ = next_tick(&mut ticker) => {
                let Some(keepalive) = keepalive else { continue };
                if relay_answers_pings && last_inbound.elapsed() >= keepalive.timeout {
                    warn!(
                        "Signaling channel stalled: nothing received for {:?}",
                        last_inbound.elapsed()
                    );
                    break CloseReason::Stalled;
                }
                if !send_frame(&outgoing, &SignalingMessage::Ping) {
                    return;
                }
            }
        }
    };

    info!("Signaling channel closed for attempt {}: {:?}", attempt, reason);
    let _ = events.send((attempt, ChannelEvent::Closed(reason))).await;
}

/// Returns false once the owner has closed the channel.
fn send_frame(outgoing: &mpsc::WeakUnboundedSender<String>, msg: &SignalingMessage) -> bool {
    let Some(tx) = outgoing.upgrade() else {
        return false;
    };
    match serde_json::to_string(msg) {
        Ok(json) => tx.send(json).is_ok(),
        Err(e) => {
            warn!("Failed to encode {}: {}", msg.tag(), e);
            true
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
