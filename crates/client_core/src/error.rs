use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed to connect to controller at {endpoint}")]
    Connect {
        endpoint: String,
        #[source]
        source: tungstenite::Error,
    },
    #[error("controller did not report readiness within {frames} frames")]
    NotReady { frames: usize },
    #[error("controller sent a frame that is not valid JSON")]
    InvalidFrame(#[source] serde_json::Error),
    #[error("controller closed the connection before the exchange finished")]
    Closed,
    #[error("failed to encode outbound message")]
    Encode(#[source] serde_json::Error),
    #[error("websocket send failed")]
    Send(#[source] tungstenite::Error),
    #[error("websocket receive failed")]
    Receive(#[source] tungstenite::Error),
}
