//! Benchmarks for low-level DSP primitives.

mod envelope;
mod lfo;
mod oscillator;

pub use envelope::bench_envelope;
pub use lfo::bench_lfo;
pub use oscillator::bench_oscillator;
