use thiserror::Error;

use crate::util::json::PathError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    /// Nothing to reproduce
    #[error("Cannot synthesize a test from an empty event batch")]
    EmptyBatch,

    /// The last event's path cannot be written into its state
    #[error("Cannot place the final state: {0}")]
    Path(#[from] PathError),
}
