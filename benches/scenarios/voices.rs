//! Benchmarks for full engine blocks at different polyphony levels.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use curvesynth::{
    dsp::oscillator::Waveform,
    synth::{
        params::{Destination, OscillatorParam, SynthState},
        SynthEngine,
    },
    channel, EngineConfig,
};

use crate::BLOCK_SIZES;

fn patch() -> SynthState {
    let mut state = SynthState::default();
    state.oscillator1.waveform = Waveform::Sawtooth;
    state.oscillator1.unison = 0.5; // 8 copies
    state.oscillator1.detune = 0.3;
    state.oscillator2 = state.oscillator1.clone();
    state.oscillator2.waveform = Waveform::Square;
    state.oscillator2.enabled = true;
    state.lfo.toggle_attachment(Destination::Oscillator {
        index: 0,
        param: OscillatorParam::Level,
    });
    state
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let state = patch();

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        for &voices in &[1usize, 8, 32] {
            let (_controller, mut lfo, mut engine) = channel(EngineConfig::default());
            engine.configure(Arc::new(state.snapshot()));
            // modulation frames land between blocks
            let _ = lfo.update(&state.lfo);

            for v in 0..voices {
                engine.note_on(110.0 * (1.0 + v as f32 / 12.0));
            }

            let id = format!("{voices}_voices");
            group.bench_with_input(BenchmarkId::new(id, size), &size, |b, _| {
                b.iter(|| {
                    lfo.tick();
                    engine.render_block(black_box(&mut left), black_box(&mut right));
                })
            });
        }
    }

    group.finish();
}
