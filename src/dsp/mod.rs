//! Low-level DSP primitives used by the voice engine.
//!
//! These components are allocation-free once constructed, making them safe to
//! embed directly inside voice structs. Table building (wavetables, LFO
//! tables) happens on the control side before anything reaches the render
//! thread.

/// Attack/hold/decay/sustain/release envelope state machine.
pub mod envelope;
/// Curve-graph sampled modulation tables.
pub mod lfo;
/// Wavetables and the unison/detune mixer.
pub mod oscillator;

pub use envelope::{EnvelopeEngine, EnvelopeStage, EnvelopeTimings};
