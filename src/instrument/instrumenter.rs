use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rand::Rng;
use serde_json::Value;

use super::backend::{BackendChannel, BackendControl, Deliver};
use super::error::InstrumentError;
use super::messages::{DispatchRequest, InboundMessage, OutboundMessage, SelectedState};
use crate::event::{flatten_commands, CapturedEvent, Cmd, Message, SerializedCommand};
use crate::registry::{ContextRegistry, ExecutionContext, RegistryError};
use crate::trace::{trace_with, DependencyTrace};
use crate::util::json::{set_path, PathError};
use crate::util::now_ms;

/// Container name reported for contexts without a container.
pub const UNKNOWN_CONTAINER: &str = "Unknown";

static GLOBAL: OnceLock<Arc<Instrumenter>> = OnceLock::new();

/// A dispatch as reported by the runtime, before it becomes an event.
#[derive(Debug, Clone)]
pub struct RawDispatch {
    pub context: Arc<ExecutionContext>,
    /// `None` for the initialization of a container instance
    pub message: Option<Message>,
    pub prev: Value,
    pub next: Value,
    pub path: Vec<String>,
    pub commands: Vec<Cmd>,
}

impl RawDispatch {
    pub fn new(context: Arc<ExecutionContext>, message: Option<Message>, prev: Value, next: Value) -> Self {
        let path = context.path.clone();
        Self {
            context,
            message,
            prev,
            next,
            path,
            commands: Vec::new(),
        }
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_commands(mut self, commands: impl IntoIterator<Item = Cmd>) -> Self {
        self.commands = commands.into_iter().collect();
        self
    }
}

/// Receiver of whole-state replacements requested by time travel.
pub trait StateSink: Send + Sync {
    fn set_state(&self, state: Value);
}

impl<F> StateSink for F
where
    F: Fn(Value) + Send + Sync,
{
    fn set_state(&self, state: Value) {
        self(state)
    }
}

/// Collects dispatches from the runtime, turns them into events and fans
/// them out to registered backends.
///
/// Callbacks into backends and the state sink always run with no lock
/// held, so a backend may call back into the instrumenter from `deliver`.
pub struct Instrumenter {
    session: String,
    message_counter: AtomicU64,
    backend_counter: AtomicU64,
    registry: Mutex<ContextRegistry>,
    backends: Mutex<Vec<BackendChannel>>,
    state_sink: Mutex<Option<Arc<dyn StateSink>>>,
}

impl Instrumenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            session: session_token(),
            message_counter: AtomicU64::new(0),
            backend_counter: AtomicU64::new(0),
            registry: Mutex::new(ContextRegistry::new()),
            backends: Mutex::new(Vec::new()),
            state_sink: Mutex::new(None),
        })
    }

    /// Binds `instance` as the process-wide instrumenter unless one is
    /// already bound; returns whichever instance ends up bound.
    pub fn install(instance: Arc<Self>) -> Arc<Self> {
        let bound = GLOBAL.get_or_init(|| instance.clone());
        if !Arc::ptr_eq(bound, &instance) {
            tracing::debug!(session = %bound.session, "Instrumenter already installed; keeping existing instance");
        }
        bound.clone()
    }

    /// The process-wide instrumenter, created on first use.
    pub fn global() -> Arc<Self> {
        GLOBAL.get_or_init(Instrumenter::new).clone()
    }

    pub fn installed() -> Option<Arc<Self>> {
        GLOBAL.get().cloned()
    }

    /// Random token prefixed to every event id of this instance.
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Builds an event from a runtime dispatch, records its context and
    /// delivers it to every backend.
    ///
    /// Returns `None` when the event does not survive serialization; the
    /// failure is logged and the runtime carries on.
    pub fn on_dispatch(&self, raw: RawDispatch) -> Option<CapturedEvent> {
        let RawDispatch {
            context,
            message,
            prev,
            next,
            path,
            commands,
        } = raw;

        let name = context.container_name().unwrap_or(UNKNOWN_CONTAINER).to_string();
        let (message, data) = match message {
            Some(message) => (message.name, message.data),
            None => (format!("Init ({name})"), Value::Null),
        };

        let event = CapturedEvent {
            id: format!("{}{}", self.session, self.message_counter.fetch_add(1, Ordering::SeqCst) + 1),
            ts: now_ms(),
            context: context.id.clone(),
            name,
            message,
            data,
            prev,
            next,
            path,
            relay: context.relay(),
            commands: flatten_commands(&commands)
                .into_iter()
                .map(SerializedCommand::from)
                .collect(),
        };

        let event = match wire_safe(&event) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(
                    context = %event.context,
                    message = %event.message,
                    error = %err,
                    "Dropping event that failed to serialize"
                );
                return None;
            }
        };

        self.registry.lock().register(context);
        self.fan_out(&event);
        Some(event)
    }

    fn fan_out(&self, event: &CapturedEvent) {
        let targets: Vec<Deliver> = {
            let mut backends = self.backends.lock();
            backends
                .iter_mut()
                .filter_map(|backend| {
                    if backend.delivers_directly() {
                        Some(backend.deliver.clone())
                    } else {
                        backend.queue.push_back(event.clone());
                        None
                    }
                })
                .collect()
        };

        for deliver in targets {
            deliver(OutboundMessage::Event(event.clone()));
        }
    }

    /// Registers a backend under `name`, replacing any backend already
    /// registered under that name.
    ///
    /// `factory` receives the control handle and returns the delivery
    /// function. The backend starts disconnected and is immediately sent
    /// the `initialized` handshake.
    pub fn add_backend<F, D>(self: &Arc<Self>, name: impl Into<String>, factory: F) -> BackendControl
    where
        F: FnOnce(BackendControl) -> D,
        D: Fn(OutboundMessage) + Send + Sync + 'static,
    {
        let name = name.into();
        let id = self.backend_counter.fetch_add(1, Ordering::SeqCst);
        let control = BackendControl::new(id, name.clone(), Arc::downgrade(self));
        let deliver: Deliver = Arc::new(factory(control.clone()));

        {
            let mut backends = self.backends.lock();
            let before = backends.len();
            backends.retain(|backend| backend.name != name);
            if backends.len() != before {
                tracing::debug!(backend = %name, "Replacing existing backend");
            }
            backends.push(BackendChannel::new(id, name.clone(), deliver.clone()));
        }

        tracing::debug!(backend = %name, id, "Backend registered");
        deliver(OutboundMessage::initialized());
        control
    }

    /// Unregisters the backend named `name`, dropping its queue.
    pub fn remove_backend(&self, name: &str) -> bool {
        let mut backends = self.backends.lock();
        let before = backends.len();
        backends.retain(|backend| backend.name != name);
        before != backends.len()
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.lock().iter().map(|b| b.name.clone()).collect()
    }

    /// Connectivity of the backend named `name`, if registered.
    pub fn is_connected(&self, name: &str) -> Option<bool> {
        self.backends
            .lock()
            .iter()
            .find(|backend| backend.name == name)
            .map(|backend| backend.connected)
    }

    /// Number of events waiting for the backend named `name` to connect.
    pub fn queued(&self, name: &str) -> usize {
        self.backends
            .lock()
            .iter()
            .find(|backend| backend.name == name)
            .map_or(0, |backend| backend.queue.len())
    }

    pub(crate) fn backend_connected(&self, id: u64) -> bool {
        self.backends
            .lock()
            .iter()
            .any(|backend| backend.id == id && backend.connected)
    }

    /// Marks the backend connected and drains its queue FIFO, one event per
    /// lock acquisition. Events dispatched meanwhile queue behind the drained
    /// ones; direct delivery resumes only once the queue is seen empty. A
    /// disconnect during the drain stops it, leaving the rest queued.
    pub(crate) fn connect_backend(&self, id: u64) {
        let deliver = {
            let mut backends = self.backends.lock();
            let Some(backend) = backends.iter_mut().find(|backend| backend.id == id) else {
                return;
            };
            backend.connected = true;
            if backend.flushing {
                return;
            }
            backend.flushing = true;
            tracing::debug!(backend = %backend.name, pending = backend.queue.len(), "Backend connected");
            backend.deliver.clone()
        };

        loop {
            let next = {
                let mut backends = self.backends.lock();
                let Some(backend) = backends.iter_mut().find(|backend| backend.id == id) else {
                    return;
                };
                let next = if backend.connected { backend.queue.pop_front() } else { None };
                match next {
                    Some(event) => event,
                    None => {
                        backend.flushing = false;
                        return;
                    }
                }
            };
            deliver(OutboundMessage::Event(next));
        }
    }

    pub(crate) fn disconnect_backend(&self, id: u64) {
        if let Some(backend) = self.backends.lock().iter_mut().find(|backend| backend.id == id) {
            backend.connected = false;
            tracing::debug!(backend = %backend.name, "Backend disconnected");
        }
    }

    fn backend_name(&self, id: u64) -> Option<String> {
        self.backends
            .lock()
            .iter()
            .find(|backend| backend.id == id)
            .map(|backend| backend.name.clone())
    }

    /// Sends `message` to the backend with `id` only.
    fn respond(&self, id: u64, message: OutboundMessage) {
        let deliver = self
            .backends
            .lock()
            .iter()
            .find(|backend| backend.id == id)
            .map(|backend| backend.deliver.clone());

        match deliver {
            Some(deliver) => deliver(message),
            None => tracing::debug!(id, "Response target no longer registered"),
        }
    }

    pub(crate) fn handle_inbound(&self, id: u64, payload: Value) -> Result<(), InstrumentError> {
        let backend = self.backend_name(id).unwrap_or_default();

        let message = match InboundMessage::from_value(payload) {
            Ok(message) => message,
            Err(err) => {
                tracing::error!(backend = %backend, error = %err, "Ignoring inbound message");
                return Ok(());
            }
        };

        match message {
            InboundMessage::Selected(selected) => {
                if let Err(err) = self.time_travel(selected) {
                    tracing::warn!(backend = %backend, error = %err, "Ignoring time travel request");
                }
                Ok(())
            }
            InboundMessage::Dispatch(request) => self.dispatch(request).inspect_err(|err| {
                tracing::warn!(backend = %backend, error = %err, "Dispatch request failed");
            }),
            InboundMessage::ContainersHandling { request_id, message } => {
                let containers = self.containers_handling(&message);
                self.respond(
                    id,
                    OutboundMessage::Containers {
                        request_id,
                        containers,
                    },
                );
                Ok(())
            }
            InboundMessage::MessageNames { request_id, prefix } => {
                let message_names = self.message_names(&prefix);
                self.respond(
                    id,
                    OutboundMessage::MessageNames {
                        request_id,
                        message_names,
                    },
                );
                Ok(())
            }
            InboundMessage::State(state) => {
                tracing::info!(backend = %backend, state = %state, "Backend state changed");
                Ok(())
            }
        }
    }

    /// Installs the function time travel uses to replace the global state.
    pub fn attach_state_sink(&self, sink: impl StateSink + 'static) {
        let sink: Arc<dyn StateSink> = Arc::new(sink);
        *self.state_sink.lock() = Some(sink);
    }

    /// Restores the state a selected event produced: `prev` with `next`
    /// written at the event's path. The sink is left untouched when the
    /// path cannot be written.
    pub fn time_travel(&self, selected: SelectedState) -> Result<(), PathError> {
        let sink = self.state_sink.lock().clone();
        let Some(sink) = sink else {
            tracing::debug!("No state sink attached; ignoring time travel");
            return Ok(());
        };
        sink.set_state(set_path(selected.prev, &selected.path, selected.next)?);
        Ok(())
    }

    /// Builds a message by name and hands it to the first live instance of
    /// the named container.
    pub fn dispatch(&self, request: DispatchRequest) -> Result<(), InstrumentError> {
        let context = self.registry.lock().container_context(&request.name)?;

        let handles = context
            .container
            .as_ref()
            .is_some_and(|container| container.handles(&request.message));
        if !handles {
            return Err(InstrumentError::MessageNotFound {
                container: request.name,
                message: request.message,
            });
        }

        let dispatcher = context
            .dispatcher()
            .cloned()
            .ok_or_else(|| InstrumentError::NoDispatcher(context.id.clone()))?;

        tracing::debug!(container = %request.name, message = %request.message, "Dispatching by name");
        dispatcher(Message::new(request.message, request.data));
        Ok(())
    }

    pub fn containers_handling(&self, message: &str) -> Vec<String> {
        self.registry.lock().containers_handling(message)
    }

    pub fn message_names(&self, prefix: &str) -> BTreeMap<String, Vec<String>> {
        self.registry.lock().message_names(prefix)
    }

    /// Traces the updater behind `event`. The updater runs outside the
    /// registry lock.
    pub fn dependency_trace(&self, event: &CapturedEvent) -> Result<DependencyTrace, RegistryError> {
        let updater = self
            .registry
            .lock()
            .resolve_updater(&event.context, &event.message)?;
        Ok(trace_with(&updater, event))
    }

    pub fn dependency_traces(&self, events: &[CapturedEvent]) -> Result<Vec<DependencyTrace>, RegistryError> {
        events.iter().map(|event| self.dependency_trace(event)).collect()
    }
}

impl std::fmt::Debug for Instrumenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumenter")
            .field("session", &self.session)
            .field("backends", &self.backend_names())
            .finish()
    }
}

/// Round-trips an event through its wire form so backends never see values
/// that cannot be serialized.
fn wire_safe(event: &CapturedEvent) -> Result<CapturedEvent, serde_json::Error> {
    serde_json::to_string(event).and_then(|text| serde_json::from_str(&text))
}

fn session_token() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..10)
        .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
        .collect();
    format!("{}{}", now_ms(), suffix)
}
