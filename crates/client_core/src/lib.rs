use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

pub mod control_channel;
pub mod error;
pub mod network_setup;
mod transport;

pub use control_channel::{ClientEvent, ConnectionHandle, ConnectionState, ControlChannelClient};
pub use error::ControlError;
pub use network_setup::NetworkSetupSession;

/// Surface that renders inbound controller messages, one unit per message.
#[async_trait]
pub trait DisplaySink: Send + Sync {
    async fn append(&self, text: &str) -> Result<()>;
}

/// Writes each message as its own line on stdout.
pub struct StdoutSink;

#[async_trait]
impl DisplaySink for StdoutSink {
    async fn append(&self, text: &str) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}
