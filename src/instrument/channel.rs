//! In-process backend speaking the JSON text wire format over a tokio
//! channel. Stands in for a socket transport: whatever drains the receiver
//! sees exactly the frames a remote observer would.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use super::backend::BackendControl;
use super::error::InstrumentError;
use super::instrumenter::Instrumenter;
use super::messages::OutboundMessage;

pub struct ChannelBackend {
    control: BackendControl,
    rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelBackend {
    /// Registers a channel backend named `name`. It starts disconnected,
    /// with the `initialized` handshake already waiting in the channel.
    pub fn attach(instrumenter: &Arc<Instrumenter>, name: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let control = instrumenter.add_backend(name, move |control| {
            let name = control.name().to_string();
            move |message: OutboundMessage| match serde_json::to_string(&message) {
                Ok(text) => {
                    if tx.send(text).is_err() {
                        tracing::trace!(backend = %name, "Channel receiver dropped");
                    }
                }
                Err(err) => {
                    tracing::warn!(backend = %name, error = %err, "Failed to encode outbound message");
                }
            }
        });
        Self { control, rx }
    }

    pub fn control(&self) -> &BackendControl {
        &self.control
    }

    pub fn connect(&self) {
        self.control.connect();
    }

    pub fn disconnect(&self) {
        self.control.disconnect();
    }

    /// Next outbound frame, waiting for one if necessary.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Feeds an inbound text frame to the instrumenter. Frames that are not
    /// JSON are logged and dropped.
    pub fn receive_text(&self, text: &str) -> Result<(), InstrumentError> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.control.send(value),
            Err(err) => {
                tracing::error!(backend = %self.control.name(), error = %err, "Dropping unparseable frame");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for ChannelBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelBackend")
            .field("control", &self.control)
            .finish()
    }
}
