pub mod config;
pub mod event;
pub mod harness;
pub mod instrument;
pub mod registry;
pub mod synth;
pub mod tape;
pub mod trace;
pub mod util;

pub use config::Config;
pub use event::{CapturedEvent, Cmd, Command, Message, SerializedCommand};
pub use harness::{isolate, HarnessError, Isolated};
pub use instrument::{
    BackendControl, ChannelBackend, InstrumentError, Instrumenter, OutboundMessage, RawDispatch,
};
pub use registry::{
    ContainerDefinition, ContextRegistry, ExecutionContext, RegistryError, Update, Updater,
};
pub use synth::{synthesize, SynthError, SynthOptions, Synthesizer};
pub use tape::{Tape, TapeBackend, TapeWriter};
pub use trace::{trace, trace_all, DependencyTrace, PathRecorder, PathSet, Tracked};
