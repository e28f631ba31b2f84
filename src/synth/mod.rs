//! Test synthesis: turning captured events into a minimal, standalone
//! `#[test]` that replays them against an isolated container.

mod error;
mod format;
mod pick;
mod synthesizer;
mod title;

pub use error::SynthError;
pub use format::LiteralWriter;
pub use pick::narrow;
pub use synthesizer::{synthesize, SynthOptions, Synthesizer};
pub use title::{runs, snake_ident, title};
