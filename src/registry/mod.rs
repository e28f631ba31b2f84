//! Registry of live execution contexts and name-based updater lookup.
//!
//! Captured events only carry names across process boundaries, so every
//! lookup here goes through the container's name→updater mapping.

mod container;
mod context;
mod error;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub use container::{ContainerDefinition, Update, Updater};
pub use context::{Dispatcher, ExecutionContext, RelayFn};
pub use error::RegistryError;

/// Contexts keyed by id, kept in first-registration order.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    contexts: Vec<Arc<ExecutionContext>>,
    index: HashMap<String, usize>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `context` under its id, replacing any previous entry in place.
    pub fn register(&mut self, context: Arc<ExecutionContext>) {
        match self.index.get(&context.id) {
            Some(&slot) => self.contexts[slot] = context,
            None => {
                self.index.insert(context.id.clone(), self.contexts.len());
                self.contexts.push(context);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<ExecutionContext>> {
        self.index.get(id).map(|&slot| &self.contexts[slot])
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Resolves the updater registered under `message` for the container
    /// attached to context `context_id`.
    pub fn resolve_updater(&self, context_id: &str, message: &str) -> Result<Updater, RegistryError> {
        let context = self
            .get(context_id)
            .ok_or_else(|| RegistryError::ContextNotFound(context_id.to_string()))?;

        let container = context
            .container
            .as_ref()
            .ok_or_else(|| RegistryError::ContainerMissing(context_id.to_string()))?;

        container
            .updater(message)
            .cloned()
            .ok_or_else(|| RegistryError::UpdaterNotFound {
                context: context_id.to_string(),
                message: message.to_string(),
            })
    }

    /// Contexts that have a container attached.
    pub fn container_contexts(&self) -> impl Iterator<Item = &Arc<ExecutionContext>> {
        self.contexts.iter().filter(|context| context.container.is_some())
    }

    /// The first registered context owning a container named `name`.
    pub fn container_context(&self, name: &str) -> Result<Arc<ExecutionContext>, RegistryError> {
        self.container_contexts()
            .find(|context| context.container_name() == Some(name))
            .cloned()
            .ok_or_else(|| RegistryError::ContainerNotFound(name.to_string()))
    }

    /// Names of containers with an updater for `message`, each listed once.
    pub fn containers_handling(&self, message: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for container in self.containers() {
            if container.handles(message) && !names.iter().any(|n| n == container.name()) {
                names.push(container.name().to_string());
            }
        }
        names
    }

    /// Every message name starting with `prefix`, mapped to the containers
    /// that handle it.
    pub fn message_names(&self, prefix: &str) -> BTreeMap<String, Vec<String>> {
        let mut result: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for container in self.containers() {
            for message in container.message_names().filter(|m| m.starts_with(prefix)) {
                let handlers = result.entry(message.to_string()).or_default();
                if !handlers.iter().any(|n| n == container.name()) {
                    handlers.push(container.name().to_string());
                }
            }
        }
        result
    }

    fn containers(&self) -> impl Iterator<Item = &ContainerDefinition> {
        self.container_contexts()
            .filter_map(|context| context.container.as_deref())
    }
}
