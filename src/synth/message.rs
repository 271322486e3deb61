use std::sync::Arc;

use crate::{error::FaultKind, synth::params::ParameterSnapshot, SAMPLE_BUFFER_LENGTH};

/// Slots in the engine → control ring. Each slot can hold a full sample
/// buffer, so this stays small.
pub const EVENT_CAPACITY: usize = 16;

/// Slots only a `Retired` event may take. Scope buffers and faults are dropped
/// first, so an undrained ring never forces a snapshot free on the render
/// thread.
pub const RETIRE_RESERVE: usize = 4;

/// Control → engine. Applied at the next block boundary, in order.
#[derive(Debug, Clone)]
pub enum SynthMessage {
    AddFrequency(f32),
    RemoveFrequency(f32),
    /// Replaces the engine's parameters wholesale.
    Snapshot(Arc<ParameterSnapshot>),
    /// Silence every voice now, skipping release.
    AllNotesOff,
}

/// Engine → control.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Mono mix of the last `SAMPLE_BUFFER_LENGTH` output frames.
    SampleBuffer([f32; SAMPLE_BUFFER_LENGTH]),
    Fault(FaultKind),
    /// A snapshot the engine no longer uses, returned so it is freed off the
    /// render thread.
    Retired(Arc<ParameterSnapshot>),
}
