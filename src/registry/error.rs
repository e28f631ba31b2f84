use thiserror::Error;

/// Lookup failures against the context registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Context '{0}' does not exist")]
    ContextNotFound(String),

    #[error("Context '{0}' does not have a container")]
    ContainerMissing(String),

    #[error("Context '{context}' has no updater for message type '{message}'")]
    UpdaterNotFound { context: String, message: String },

    #[error("Container '{0}' does not exist")]
    ContainerNotFound(String),
}
