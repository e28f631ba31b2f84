use std::sync::Arc;

use serde_json::{Map, Value};

use super::container::ContainerDefinition;
use crate::event::Message;

/// Accessor for context-scoped relay data.
pub type RelayFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Live dispatch entry point of a running container instance.
pub type Dispatcher = Arc<dyn Fn(Message) + Send + Sync>;

/// One live container instance, as seen by the instrumenter.
#[derive(Clone)]
pub struct ExecutionContext {
    pub id: String,
    pub container: Option<Arc<ContainerDefinition>>,
    /// Location of this instance's model within the global state
    pub path: Vec<String>,
    relay: RelayFn,
    dispatcher: Option<Dispatcher>,
}

impl ExecutionContext {
    pub fn new(id: impl Into<String>, container: Option<Arc<ContainerDefinition>>) -> Self {
        Self {
            id: id.into(),
            container,
            path: Vec::new(),
            relay: Arc::new(|| Value::Object(Map::new())),
            dispatcher: None,
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

    pub fn with_relay(mut self, relay: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.relay = Arc::new(relay);
        self
    }

    pub fn with_dispatcher(mut self, dispatch: impl Fn(Message) + Send + Sync + 'static) -> Self {
        self.dispatcher = Some(Arc::new(dispatch));
        self
    }

    /// Current relay data for this context.
    pub fn relay(&self) -> Value {
        (self.relay)()
    }

    pub fn dispatcher(&self) -> Option<&Dispatcher> {
        self.dispatcher.as_ref()
    }

    pub fn container_name(&self) -> Option<&str> {
        self.container.as_deref().map(ContainerDefinition::name)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("container", &self.container_name())
            .field("path", &self.path)
            .field("dispatcher", &self.dispatcher.is_some())
            .finish()
    }
}
