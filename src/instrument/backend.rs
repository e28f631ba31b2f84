use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use serde_json::Value;

use super::error::InstrumentError;
use super::instrumenter::Instrumenter;
use super::messages::OutboundMessage;
use crate::event::CapturedEvent;

/// Delivery function a backend hands back on registration.
pub type Deliver = Arc<dyn Fn(OutboundMessage) + Send + Sync>;

/// Connectivity state and pending queue of one registered backend.
pub(crate) struct BackendChannel {
    pub id: u64,
    pub name: String,
    pub connected: bool,
    /// A connect is draining `queue`; new events keep queueing behind it
    pub flushing: bool,
    pub queue: VecDeque<CapturedEvent>,
    pub deliver: Deliver,
}

impl BackendChannel {
    /// Whether new events go straight to `deliver` instead of the queue.
    pub fn delivers_directly(&self) -> bool {
        self.connected && !self.flushing
    }

    pub fn new(id: u64, name: String, deliver: Deliver) -> Self {
        Self {
            id,
            name,
            connected: false,
            flushing: false,
            queue: VecDeque::new(),
            deliver,
        }
    }
}

/// Handle through which a backend drives its own channel: toggling
/// connectivity and pushing observer requests into the instrumenter.
///
/// Holds a weak reference, so a backend that outlives its instrumenter
/// simply becomes inert.
#[derive(Clone)]
pub struct BackendControl {
    pub(crate) id: u64,
    name: String,
    instrumenter: Weak<Instrumenter>,
}

impl BackendControl {
    pub(crate) fn new(id: u64, name: String, instrumenter: Weak<Instrumenter>) -> Self {
        Self {
            id,
            name,
            instrumenter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Marks the backend connected and flushes its queue in arrival order.
    pub fn connect(&self) {
        if let Some(instrumenter) = self.instrumenter.upgrade() {
            instrumenter.connect_backend(self.id);
        }
    }

    /// Marks the backend disconnected; later events queue until `connect`.
    pub fn disconnect(&self) {
        if let Some(instrumenter) = self.instrumenter.upgrade() {
            instrumenter.disconnect_backend(self.id);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.instrumenter
            .upgrade()
            .is_some_and(|instrumenter| instrumenter.backend_connected(self.id))
    }

    /// Pushes an observer-originated request into the instrumenter.
    ///
    /// Unrecognized payloads are logged and dropped. Failed dispatch
    /// lookups are logged and returned.
    pub fn send(&self, msg: Value) -> Result<(), InstrumentError> {
        match self.instrumenter.upgrade() {
            Some(instrumenter) => instrumenter.handle_inbound(self.id, msg),
            None => {
                tracing::debug!(backend = %self.name, "Instrumenter dropped; ignoring inbound message");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for BackendControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendControl")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
