use crate::error::{ClientError, ClientResult};
use pairlink_core::utils::CREATE_ROOM_PATH;
use pairlink_core::{CreateRoomResponse, RoomCode};
use tracing::info;

/// Maps a relay service address onto its HTTP base URL.
pub fn http_base_url(service_address: &str) -> String {
    let address = service_address.trim().trim_end_matches('/');
    if let Some(rest) = address.strip_prefix("wss://") {
        return format!("https://{rest}");
    }
    if let Some(rest) = address.strip_prefix("ws://") {
        return format!("http://{rest}");
    }
    address.to_owned()
}

/// Asks the relay service for a fresh room code. Opens no signaling channel.
pub async fn create_room(http: &reqwest::Client, service_address: &str) -> ClientResult<RoomCode> {
    let url = format!("{}{}", http_base_url(service_address), CREATE_ROOM_PATH);

    let response = http
        .post(&url)
        .send()
        .await
        .map_err(|e| ClientError::Transport(format!("room creation request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Transport(format!(
            "room creation failed with status {status}"
        )));
    }

    let body: CreateRoomResponse = response
        .json()
        .await
        .map_err(|e| ClientError::Transport(format!("invalid room creation response: {e}")))?;

    info!("Room {} created at {}", body.room_code, url);
    Ok(body.room_code)
}
