use crate::error::ClientResult;
use pairlink_core::{IceCandidate, SessionDescription, SignalingMessage};

/// Outgoing half of the signaling protocol, as seen by the session negotiator.
pub trait SignalingOutput: Send + Sync {
    fn send_signal(&self, msg: SignalingMessage) -> ClientResult<()>;

    fn send_offer(&self, payload: SessionDescription) -> ClientResult<()> {
        self.send_signal(SignalingMessage::Offer { payload })
    }

    fn send_answer(&self, payload: SessionDescription) -> ClientResult<()> {
        self.send_signal(SignalingMessage::Answer { payload })
    }

    fn send_ice(&self, payload: IceCandidate) -> ClientResult<()> {
        self.send_signal(SignalingMessage::IceCandidate { payload })
    }
}
