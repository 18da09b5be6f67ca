use crate::error::{ClientError, ClientResult};
use crate::signaling::connector::{FramePipe, SignalingConnector};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Maps a relay service address onto its websocket endpoint.
pub fn websocket_url(service_address: &str) -> ClientResult<String> {
    let address = service_address.trim().trim_end_matches('/');
    if let Some(rest) = address.strip_prefix("https://") {
        return Ok(format!("wss://{rest}"));
    }
    if let Some(rest) = address.strip_prefix("http://") {
        return Ok(format!("ws://{rest}"));
    }
    if address.starts_with("ws://") || address.starts_with("wss://") {
        return Ok(address.to_owned());
    }
    Err(ClientError::Transport(format!(
        "unsupported service address: {service_address}"
    )))
}

/// Connects to the relay over a websocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl SignalingConnector for WebSocketConnector {
    async fn connect(&self, service_address: &str) -> ClientResult<FramePipe> {
        let url = websocket_url(service_address)?;
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ClientError::Transport(format!("websocket connect to {url} failed: {e}")))?;
        info!("Signaling websocket connected: {}", url);

        let (mut sender, mut receiver) = socket.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<String>();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(text) = outgoing_rx.recv().await {
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            let _ = sender.close().await;
            debug!("Signaling websocket writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = receiver.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if incoming_tx.send(text.to_string()).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Signaling websocket error: {}", e);
                        break;
                    }
                }
            }
            debug!("Signaling websocket reader finished");
        });

        Ok(FramePipe {
            outgoing: outgoing_tx,
            incoming: incoming_rx,
        })
    }
}
