//! Dependency tracing: discovering which paths of the model, the message
//! data and the relay an updater reads.

mod path_set;
mod recorder;
mod tracer;

pub use path_set::{Path, PathSet};
pub use recorder::{PathRecorder, ReadSink, Tracked};
pub use tracer::{trace, trace_all, trace_with, DependencyTrace};
