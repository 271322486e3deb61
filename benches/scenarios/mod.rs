//! Real-world scenario benchmarks.
//!
//! Whole render blocks through the VoiceManager, the way the audio callback
//! drives it.

mod voices;

pub use voices::bench_voices;
