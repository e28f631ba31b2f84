use std::sync::Arc;

use serde_json::Value;

use crate::event::Cmd;
use crate::trace::Tracked;

/// Result of running an updater: the new model slice plus any commands.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub model: Value,
    pub commands: Vec<Cmd>,
}

impl Update {
    pub fn new(model: Value) -> Self {
        Self {
            model,
            commands: Vec::new(),
        }
    }

    pub fn with_command(mut self, cmd: impl Into<Cmd>) -> Self {
        self.commands.push(cmd.into());
        self
    }
}

impl From<Value> for Update {
    fn from(model: Value) -> Self {
        Update::new(model)
    }
}

/// An update function: `(model, data, relay) -> Update`.
pub type Updater =
    Arc<dyn for<'a> Fn(Tracked<'a>, Tracked<'a>, Tracked<'a>) -> Update + Send + Sync>;

/// A named unit of application state and the updaters that handle its
/// messages, keyed by message type name.
pub struct ContainerDefinition {
    name: String,
    updaters: Vec<(String, Updater)>,
}

impl ContainerDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            updaters: Vec::new(),
        }
    }

    /// Registers the updater for `message`. A later registration under the
    /// same name replaces the earlier one.
    pub fn on<F, R>(mut self, message: impl Into<String>, update: F) -> Self
    where
        F: for<'a> Fn(Tracked<'a>, Tracked<'a>, Tracked<'a>) -> R + Send + Sync + 'static,
        R: Into<Update>,
    {
        let message = message.into();
        let updater: Updater = Arc::new(
            move |model: Tracked<'_>, data: Tracked<'_>, relay: Tracked<'_>| {
                update(model, data, relay).into()
            },
        );
        self.updaters.retain(|(name, _)| name != &message);
        self.updaters.push((message, updater));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn updater(&self, message: &str) -> Option<&Updater> {
        self.updaters
            .iter()
            .find(|(name, _)| name == message)
            .map(|(_, updater)| updater)
    }

    pub fn handles(&self, message: &str) -> bool {
        self.updater(message).is_some()
    }

    /// Message type names in registration order.
    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.updaters.iter().map(|(name, _)| name.as_str())
    }
}

impl std::fmt::Debug for ContainerDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerDefinition")
            .field("name", &self.name)
            .field("messages", &self.message_names().collect::<Vec<_>>())
            .finish()
    }
}
