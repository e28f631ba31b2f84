use thiserror::Error;

use crate::registry::RegistryError;

/// Errors surfaced by instrumenter operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    /// Context, container or updater lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The named container does not handle the requested message type
    #[error("Container '{container}' does not handle messages of type '{message}'")]
    MessageNotFound { container: String, message: String },

    /// The container instance exposes no live dispatch entry point
    #[error("Context '{0}' cannot dispatch messages")]
    NoDispatcher(String),

    /// Inbound backend payload matched no known request shape
    #[error("Invalid inbound message: {0}")]
    InvalidInboundMessage(String),
}
