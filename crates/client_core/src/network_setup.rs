use futures::{SinkExt, StreamExt};
use serde::Serialize;
use shared::{
    domain::ConnectionEndpoint,
    protocol::{ControllerFrame, ControllerTask, PageUpdate, TaskRequest},
};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::{
    error::ControlError,
    transport::{self, ControllerStream},
};

/// The controller emits `boot_file_error` shortly after a client attaches to
/// `network.htm`; give up if it has not shown up within this many data frames.
const READY_FRAME_LIMIT: usize = 10;

/// One-shot exchange that registers this computer's address with the controller.
pub struct NetworkSetupSession {
    endpoint: ConnectionEndpoint,
}

impl NetworkSetupSession {
    pub fn new(endpoint: ConnectionEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &ConnectionEndpoint {
        &self.endpoint
    }

    pub async fn register_remote_ip(&self, remote_ip: &str) -> Result<(), ControlError> {
        let mut stream =
            transport::open(&self.endpoint)
                .await
                .map_err(|source| ControlError::Connect {
                    endpoint: self.endpoint.to_string(),
                    source,
                })?;

        let outcome = exchange(&mut stream, remote_ip).await;
        if let Err(err) = stream.close(None).await {
            debug!(error = %err, "network setup: close failed");
        }
        outcome
    }
}

async fn exchange(stream: &mut ControllerStream, remote_ip: &str) -> Result<(), ControlError> {
    wait_until_ready(stream).await?;
    send_json(stream, &PageUpdate::remote_ip(remote_ip)).await?;
    send_json(stream, &TaskRequest::new(ControllerTask::SaveNetworkDevices)).await?;
    info!(remote_ip, "network setup: remote address saved");
    Ok(())
}

async fn wait_until_ready(stream: &mut ControllerStream) -> Result<(), ControlError> {
    let mut frames = 0;
    while frames < READY_FRAME_LIMIT {
        let Some(message) = stream.next().await else {
            return Err(ControlError::Closed);
        };
        let frame: ControllerFrame = match message.map_err(ControlError::Receive)? {
            Message::Text(text) => {
                serde_json::from_str(&text).map_err(ControlError::InvalidFrame)?
            }
            Message::Binary(bytes) => {
                serde_json::from_slice(&bytes).map_err(ControlError::InvalidFrame)?
            }
            Message::Close(_) => return Err(ControlError::Closed),
            _ => continue,
        };
        frames += 1;
        if frame.is_boot_file_error() {
            debug!(frames, "network setup: controller ready");
            return Ok(());
        }
    }
    Err(ControlError::NotReady {
        frames: READY_FRAME_LIMIT,
    })
}

async fn send_json<T: Serialize>(
    stream: &mut ControllerStream,
    message: &T,
) -> Result<(), ControlError> {
    let text = serde_json::to_string(message).map_err(ControlError::Encode)?;
    debug!(%text, "network setup: sending");
    stream
        .send(Message::Text(text))
        .await
        .map_err(ControlError::Send)
}

#[cfg(test)]
#[path = "tests/network_setup_tests.rs"]
mod tests;
