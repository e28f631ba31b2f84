use std::io;
use std::path::Path;
use std::sync::Arc;

use super::TapeWriter;
use crate::instrument::{BackendControl, Instrumenter, OutboundMessage};

/// Backend that records every outbound message to a tape file.
pub struct TapeBackend;

impl TapeBackend {
    /// Registers a recording backend named `name` and connects it, so it
    /// sees the handshake followed by every event from now on.
    pub fn install(instrumenter: &Arc<Instrumenter>, name: &str, writer: Arc<TapeWriter>) -> BackendControl {
        let control = instrumenter.add_backend(name, move |control| {
            let name = control.name().to_string();
            move |message: OutboundMessage| {
                if let Err(err) = writer.record(message) {
                    tracing::warn!(backend = %name, error = %err, "Failed to append to tape");
                }
            }
        });
        control.connect();
        tracing::info!(backend = %name, "Recording to tape");
        control
    }

    /// Creates the tape at `path` and installs a recorder writing to it.
    pub fn record_to(instrumenter: &Arc<Instrumenter>, path: &Path) -> io::Result<BackendControl> {
        let writer = Arc::new(TapeWriter::create(path)?);
        Ok(Self::install(instrumenter, "tape", writer))
    }
}
