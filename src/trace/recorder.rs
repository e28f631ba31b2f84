//! Read-recording views over JSON values.
//!
//! A [`Tracked`] view exposes the read side of a `serde_json::Value`. Every
//! key lookup and every key enumeration made through it reports the full path
//! from the recorder's root to a [`PathRecorder`]. Nested containers come
//! back as further views, so reads keep being recorded relative to the root.
//! Scalars and `null` are handed out as plain values.
//!
//! Updaters are written against `Tracked`; live dispatch hands them
//! [`Tracked::untracked`] views, tracing hands them recorded ones.

use std::cell::RefCell;

use serde_json::{Map, Value};

use super::path_set::{Path, PathSet};
use crate::util::json::{child, is_container};

type ReadCallback<'cb> = Box<dyn Fn(&[String]) + 'cb>;

/// Sink for read notifications.
pub trait ReadSink {
    fn record(&self, path: Path);
}

/// Accumulates the deduplicated set of paths read through its views.
pub struct PathRecorder<'cb> {
    seen: RefCell<PathSet>,
    on_read: Option<ReadCallback<'cb>>,
}

impl<'cb> PathRecorder<'cb> {
    pub fn new() -> Self {
        Self {
            seen: RefCell::new(PathSet::new()),
            on_read: None,
        }
    }

    /// A recorder that also calls `on_read` the first time each path is read.
    pub fn with_callback(on_read: impl Fn(&[String]) + 'cb) -> Self {
        Self {
            seen: RefCell::new(PathSet::new()),
            on_read: Some(Box::new(on_read)),
        }
    }

    /// Wraps `value` so reads through it are recorded as `base` + key path.
    pub fn wrap<'a, S: AsRef<str>>(&'a self, value: &'a Value, base: &[S]) -> Tracked<'a> {
        Tracked {
            value,
            path: base.iter().map(|s| s.as_ref().to_string()).collect(),
            sink: Some(self),
        }
    }

    /// Snapshot of the paths recorded so far.
    pub fn paths(&self) -> PathSet {
        self.seen.borrow().clone()
    }

    pub fn into_paths(self) -> PathSet {
        self.seen.into_inner()
    }
}

impl Default for PathRecorder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadSink for PathRecorder<'_> {
    fn record(&self, path: Path) {
        if self.seen.borrow().contains(path.as_slice()) {
            return;
        }
        if let Some(on_read) = &self.on_read {
            on_read(&path);
        }
        self.seen.borrow_mut().insert(path);
    }
}

/// Read-only view of a JSON value that reports reads to a recorder.
#[derive(Clone)]
pub struct Tracked<'a> {
    value: &'a Value,
    path: Path,
    sink: Option<&'a dyn ReadSink>,
}

impl<'a> Tracked<'a> {
    /// A view that records nothing.
    pub fn untracked(value: &'a Value) -> Self {
        Self {
            value,
            path: Vec::new(),
            sink: None,
        }
    }

    /// Path of this view from the recorder's root.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    fn child_path(&self, key: &str) -> Path {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend(self.path.iter().cloned());
        path.push(key.to_string());
        path
    }

    fn record(&self, path: &Path) {
        if let Some(sink) = self.sink {
            sink.record(path.clone());
        }
    }

    fn descend(&self, key: &str) -> Option<Tracked<'a>> {
        if !is_container(self.value) {
            return None;
        }
        let path = self.child_path(key);
        self.record(&path);
        child(self.value, key).map(|value| Tracked {
            value,
            path,
            sink: self.sink,
        })
    }

    /// Reads an object field (or an array element by its decimal index).
    /// The read is recorded even when the key is absent.
    pub fn get(&self, key: &str) -> Option<Tracked<'a>> {
        self.descend(key)
    }

    /// Reads an array element.
    pub fn index(&self, idx: usize) -> Option<Tracked<'a>> {
        self.descend(&idx.to_string())
    }

    /// Follows `keys` from this view, recording each step.
    pub fn get_path<S: AsRef<str>>(&self, keys: &[S]) -> Option<Tracked<'a>> {
        keys.iter()
            .try_fold(self.clone(), |view, key| view.get(key.as_ref()))
    }

    /// Enumerates the keys of an object, or the indices of an array.
    /// Each key's path is recorded.
    pub fn keys(&self) -> Vec<String> {
        let keys: Vec<String> = match self.value {
            Value::Object(map) => map.keys().cloned().collect(),
            Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        };
        for key in &keys {
            self.record(&self.child_path(key));
        }
        keys
    }

    /// Enumerates and reads every entry.
    pub fn entries(&self) -> Vec<(String, Tracked<'a>)> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.get(&key).map(|view| (key, view)))
            .collect()
    }

    /// Counting entries enumerates them.
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_object(&self) -> bool {
        self.value.is_object()
    }

    pub fn is_array(&self) -> bool {
        self.value.is_array()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.value.as_i64()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.value.as_u64()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.value.as_str()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// Materializes the subtree, reading every key beneath this view.
    pub fn to_value(&self) -> Value {
        match self.value {
            Value::Object(_) => {
                let map: Map<String, Value> = self
                    .entries()
                    .into_iter()
                    .map(|(key, view)| (key, view.to_value()))
                    .collect();
                Value::Object(map)
            }
            Value::Array(_) => Value::Array(
                self.entries()
                    .into_iter()
                    .map(|(_, view)| view.to_value())
                    .collect(),
            ),
            scalar => scalar.clone(),
        }
    }
}

impl std::fmt::Debug for Tracked<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracked")
            .field("path", &self.path)
            .field("recording", &self.sink.is_some())
            .finish()
    }
}
