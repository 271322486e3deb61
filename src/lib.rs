pub mod curve; // Editable node/edge chains for envelope and LFO shapes
pub mod dsp;
pub mod error;
pub mod synth; // Voice management, parameter snapshots, LFO scheduling

pub use error::{CurveError, FaultKind};
pub use synth::{channel, EngineConfig, SynthController, SynthEngine, VoiceManager};

pub const MAX_BLOCK_SIZE: usize = 2048;
/// Length of the mono buffer the engine publishes for visualization.
pub const SAMPLE_BUFFER_LENGTH: usize = 2048;
