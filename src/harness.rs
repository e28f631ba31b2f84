//! Runs a single container against an in-memory state, outside any live
//! application. Synthesized tests drive containers through this.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::event::{flatten_commands, Command, Message};
use crate::registry::{ContainerDefinition, RegistryError};
use crate::trace::Tracked;
use crate::util::json::{set_path, value_at, PathError};

/// Failures of an isolated dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The container's path cannot be written into the state
    #[error(transparent)]
    Path(#[from] PathError),
}

/// A container detached from the runtime, holding its own global state.
pub struct Isolated {
    container: Arc<ContainerDefinition>,
    path: Vec<String>,
    relay: Value,
    state: Value,
}

/// Wraps `container` for isolated dispatch. The state starts as `{}` and the
/// container's model lives at the root until [`Isolated::at`] moves it.
pub fn isolate(container: Arc<ContainerDefinition>) -> Isolated {
    Isolated {
        container,
        path: Vec::new(),
        relay: Value::Object(Map::new()),
        state: Value::Object(Map::new()),
    }
}

impl Isolated {
    pub fn with_relay(mut self, relay: Value) -> Self {
        self.relay = relay;
        self
    }

    /// Places the container's model at `path` within the global state.
    pub fn at<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the whole global state.
    pub fn push(&mut self, state: Value) {
        self.state = state;
    }

    /// Runs the updater for `message` and writes its model back at the
    /// container's path. The state is unchanged on error.
    pub fn dispatch(&mut self, message: Message) -> Result<Vec<Command>, HarnessError> {
        let updater = self
            .container
            .updater(&message.name)
            .cloned()
            .ok_or_else(|| RegistryError::UpdaterNotFound {
                context: self.container.name().to_string(),
                message: message.name.clone(),
            })?;

        let empty = Value::Object(Map::new());
        let model = value_at(&self.state, &self.path)
            .filter(|value| !value.is_null())
            .unwrap_or(&empty);
        let data = if message.data.is_null() { &empty } else { &message.data };

        let update = updater(
            Tracked::untracked(model),
            Tracked::untracked(data),
            Tracked::untracked(&self.relay),
        );

        self.state = set_path(self.state.clone(), &self.path, update.model)?;
        Ok(flatten_commands(&update.commands))
    }

    /// Dispatches each message in order, collecting all commands. Stops at
    /// the first unknown message.
    pub fn dispatch_all(
        &mut self,
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<Vec<Command>, HarnessError> {
        let mut commands = Vec::new();
        for message in messages {
            commands.extend(self.dispatch(message)?);
        }
        Ok(commands)
    }

    pub fn state(&self) -> Value {
        self.state.clone()
    }
}

impl std::fmt::Debug for Isolated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Isolated")
            .field("container", &self.container.name())
            .field("path", &self.path)
            .field("state", &self.state)
            .finish()
    }
}
