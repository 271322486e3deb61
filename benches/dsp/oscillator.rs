//! Benchmarks for wavetable playback with unison.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use curvesynth::dsp::oscillator::{UnisonOscillator, Waveform, Wavetable, WAVETABLE_LENGTH};
use curvesynth::synth::params::OscillatorRuntime;

use crate::BLOCK_SIZES;

fn render(osc: &mut UnisonOscillator, table: &Wavetable, params: &OscillatorRuntime, out: &mut [f32]) {
    for sample in out.iter_mut() {
        let (l, r) = osc.next_frame(table, params);
        *sample = l + r;
    }
}

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let Some(table) = Wavetable::from_waveform(&Waveform::Sawtooth, WAVETABLE_LENGTH) else {
        return;
    };

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Single copy - the common case
        let params = OscillatorRuntime {
            unison: 1,
            detune: 0.0,
            pan: 0.5,
            level: 1.0,
            enabled: true,
        };
        let mut osc = UnisonOscillator::new();
        osc.prepare(440.0, &params, table.len(), 48_000.0);
        group.bench_with_input(BenchmarkId::new("unison_1", size), &size, |b, _| {
            b.iter(|| render(&mut osc, &table, &params, black_box(&mut buffer)))
        });

        // Full unison stack, worst case per voice
        let params = OscillatorRuntime {
            unison: 16,
            detune: 0.5,
            ..params
        };
        let mut osc = UnisonOscillator::new();
        osc.prepare(440.0, &params, table.len(), 48_000.0);
        group.bench_with_input(BenchmarkId::new("unison_16", size), &size, |b, _| {
            b.iter(|| render(&mut osc, &table, &params, black_box(&mut buffer)))
        });
    }

    group.finish();
}
