//! Capture of runtime dispatches and their delivery to observer backends.

mod backend;
mod channel;
mod error;
mod instrumenter;
mod messages;

pub use backend::{BackendControl, Deliver};
pub use channel::ChannelBackend;
pub use error::InstrumentError;
pub use instrumenter::{Instrumenter, RawDispatch, StateSink, UNKNOWN_CONTAINER};
pub use messages::{
    DispatchRequest, InboundMessage, OutboundMessage, SelectedState, STATE_INITIALIZED,
};
