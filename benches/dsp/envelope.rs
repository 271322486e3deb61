//! Benchmarks for the AHDSR weight computation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use curvesynth::dsp::envelope::{EnvelopeEngine, EnvelopeTimings};

use crate::BLOCK_SIZES;

const MS_PER_FRAME: f64 = 1000.0 / 48_000.0;

fn render(env: &mut EnvelopeEngine, timings: &EnvelopeTimings, start_ms: f64, out: &mut [f32]) {
    for (i, sample) in out.iter_mut().enumerate() {
        *sample = env.weight_at(start_ms + i as f64 * MS_PER_FRAME, timings);
    }
}

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let timings = EnvelopeTimings {
        attack_ms: 10.0,
        hold_ms: 10.0,
        decay_ms: 100.0,
        sustain: 0.7,
        release_ms: 300.0,
    };

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let mut env = EnvelopeEngine::new();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| render(&mut env, &timings, 0.0, black_box(&mut buffer)))
        });

        // Sustain phase (holding steady)
        let mut env = EnvelopeEngine::new();
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| render(&mut env, &timings, 500.0, black_box(&mut buffer)))
        });

        // Release phase (ramping down)
        let mut env = EnvelopeEngine::new();
        env.release(500.0, &timings);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| render(&mut env, &timings, 550.0, black_box(&mut buffer)))
        });
    }

    group.finish();
}
