//! Control-channel client for the controller's `control.htm` page.
//!
//! One client drives one connection. When the handshake completes, the client
//! sends its [`TuneCommand`] once. After that it only relays inbound text frames
//! to a [`DisplaySink`]. Nothing is retried or validated. A connection that fails
//! to open stays [`ConnectionState::Idle`].

use std::sync::Arc;

use futures::{Sink, SinkExt, StreamExt};
use shared::{domain::ConnectionEndpoint, protocol::TuneCommand};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use crate::{transport, DisplaySink};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Open,
    /// Terminal. Reached when the stream ends; nothing reacts to it.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Opened,
    CommandSent(String),
    Message(String),
    Closed,
    ConnectFailed(String),
    Error(String),
}

pub struct ControlChannelClient {
    command: TuneCommand,
    sink: Arc<dyn DisplaySink>,
    events: broadcast::Sender<ClientEvent>,
}

impl ControlChannelClient {
    pub fn new(command: TuneCommand, sink: Arc<dyn DisplaySink>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            command,
            sink,
            events,
        }
    }

    pub fn with_default_command(sink: Arc<dyn DisplaySink>) -> Self {
        Self::new(TuneCommand::default(), sink)
    }

    pub fn command(&self) -> &TuneCommand {
        &self.command
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Spawns the connection driver. Must be called from within a tokio runtime.
    pub fn connect(self, endpoint: ConnectionEndpoint) -> ConnectionHandle {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let task = tokio::spawn(self.run(endpoint, state_tx));
        ConnectionHandle {
            state: state_rx,
            task,
        }
    }

    async fn run(self, endpoint: ConnectionEndpoint, state: watch::Sender<ConnectionState>) {
        let stream = match transport::open(&endpoint).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(%endpoint, error = %err, "control channel: connection never opened");
                let _ = self.events.send(ClientEvent::ConnectFailed(err.to_string()));
                return;
            }
        };

        state.send_replace(ConnectionState::Open);
        info!(%endpoint, "control channel: open");
        let _ = self.events.send(ClientEvent::Opened);

        let (mut writer, mut reader) = stream.split();
        self.send_command(&mut writer).await;

        while let Some(frame) = reader.next().await {
            match frame {
                Ok(Message::Text(text)) => self.relay(text).await,
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "control channel: close frame received");
                }
                Ok(_) => debug!("control channel: skipping non-text frame"),
                Err(err) => {
                    warn!(%endpoint, error = %err, "control channel: receive failed");
                    let _ = self.events.send(ClientEvent::Error(err.to_string()));
                    break;
                }
            }
        }

        state.send_replace(ConnectionState::Closed);
        info!(%endpoint, "control channel: closed");
        let _ = self.events.send(ClientEvent::Closed);
    }

    async fn send_command<W>(&self, writer: &mut W)
    where
        W: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        let frame = match self.command.to_frame() {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "control channel: failed to encode tune command");
                let _ = self.events.send(ClientEvent::Error(err.to_string()));
                return;
            }
        };

        match writer.send(Message::Text(frame.clone())).await {
            Ok(()) => {
                info!(
                    wavelength_nm = self.command.wavelength_nm,
                    wavelength_step_nm = self.command.wavelength_step_nm,
                    "control channel: tune command sent"
                );
                let _ = self.events.send(ClientEvent::CommandSent(frame));
            }
            Err(err) => {
                warn!(error = %err, "control channel: failed to send tune command");
                let _ = self.events.send(ClientEvent::Error(err.to_string()));
            }
        }
    }

    async fn relay(&self, text: String) {
        if let Err(err) = self.sink.append(&text).await {
            warn!(error = %err, "control channel: display sink rejected message");
        }
        let _ = self.events.send(ClientEvent::Message(text));
    }
}

/// Owned view of a running connection.
pub struct ConnectionHandle {
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Waits until the state leaves `Idle`. Returns `false` if the driver stopped first.
    pub async fn opened(&mut self) -> bool {
        self.state
            .wait_for(|state| *state != ConnectionState::Idle)
            .await
            .is_ok()
    }

    /// Waits for the driver to stop and returns the final state.
    pub async fn finished(self) -> ConnectionState {
        if let Err(err) = self.task.await {
            warn!(error = %err, "control channel: driver task ended abnormally");
        }
        *self.state.borrow()
    }
}

#[cfg(test)]
#[path = "tests/control_channel_tests.rs"]
mod tests;
