use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::path_set::PathSet;
use super::recorder::PathRecorder;
use crate::event::CapturedEvent;
use crate::registry::{ContextRegistry, RegistryError, Updater};
use crate::util::json::value_at;

/// The paths of model, message data and relay an updater read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyTrace {
    #[serde(default)]
    pub model: PathSet,
    #[serde(default)]
    pub message: PathSet,
    #[serde(default)]
    pub relay: PathSet,
}

impl DependencyTrace {
    pub fn is_empty(&self) -> bool {
        self.model.is_empty() && self.message.is_empty() && self.relay.is_empty()
    }

    /// Unions each field with `other`'s, keeping first-seen order.
    pub fn merge(&mut self, other: &DependencyTrace) {
        self.model.union(&other.model);
        self.message.union(&other.message);
        self.relay.union(&other.relay);
    }

    /// Field-wise union of a sequence of traces.
    pub fn aggregate<'a>(traces: impl IntoIterator<Item = &'a DependencyTrace>) -> Self {
        traces
            .into_iter()
            .fold(DependencyTrace::default(), |mut acc, trace| {
                acc.merge(trace);
                acc
            })
    }
}

/// Re-runs the updater that produced `event` and records what it reads.
pub fn trace(registry: &ContextRegistry, event: &CapturedEvent) -> Result<DependencyTrace, RegistryError> {
    let updater = registry.resolve_updater(&event.context, &event.message)?;
    Ok(trace_with(&updater, event))
}

/// Traces each event independently, in order.
pub fn trace_all(
    registry: &ContextRegistry,
    events: &[CapturedEvent],
) -> Result<Vec<DependencyTrace>, RegistryError> {
    events.iter().map(|event| trace(registry, event)).collect()
}

/// Runs `updater` once over recorded views of `event` and returns the reads.
///
/// The model view is the slice of `prev` at the event's path, rooted at that
/// path, so recorded model paths address `prev` directly. The updater's
/// return value is discarded.
pub fn trace_with(updater: &Updater, event: &CapturedEvent) -> DependencyTrace {
    let empty = Value::Object(Map::new());

    let model_root = value_at(&event.prev, &event.path)
        .filter(|value| !value.is_null())
        .unwrap_or(&empty);
    let data = if event.data.is_null() { &empty } else { &event.data };

    let model = PathRecorder::new();
    let message = PathRecorder::new();
    let relay = PathRecorder::new();

    let _ = updater(
        model.wrap(model_root, &event.path),
        message.wrap::<&str>(data, &[]),
        relay.wrap::<&str>(&event.relay, &[]),
    );

    DependencyTrace {
        model: model.into_paths(),
        message: message.into_paths(),
        relay: relay.into_paths(),
    }
}
