//! Benchmarks for LFO table rebuilds.
//!
//! Rebuilds happen on the scheduler thread whenever the shape or rate changes,
//! so they only need to stay well under one control tick.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use curvesynth::curve::CurveGraph;
use curvesynth::dsp::lfo::LfoTable;

pub fn bench_lfo(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/lfo");

    let simple = CurveGraph::default_lfo();
    let busy = CurveGraph::chain(
        &(0..=32)
            .map(|i| (i as f32 / 32.0, if i % 2 == 0 { 1.0 } else { 0.0 }))
            .collect::<Vec<_>>(),
    );

    for &period in &[63usize, 250, 1000] {
        group.bench_with_input(BenchmarkId::new("default_shape", period), &period, |b, &p| {
            b.iter(|| LfoTable::build(black_box(&simple), p))
        });
        group.bench_with_input(BenchmarkId::new("33_nodes", period), &period, |b, &p| {
            b.iter(|| LfoTable::build(black_box(&busy), p))
        });
    }

    group.finish();
}
