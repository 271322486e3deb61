//! Low Frequency Oscillator (LFO) tables sampled from a curve graph.

use crate::{
    curve::{CurveGraph, CurveNode},
    error::CurveError,
};

/*
Curve-Drawn LFOs
================

The LFO shape is a curve graph drawn by the user across one period. Instead
of evaluating the graph at control rate, the whole period is sampled once
into a table with one entry per millisecond:

    ratio(i) = i / period_ms                 i in 0..period_ms
    value(i) = lerp(1 - y_source, 1 - y_target, t)

where the edge whose x-span contains `ratio` is found and `t` is the
position of `ratio` inside that span. The graph's y axis points down (it is
drawn in screen space), so values are flipped to make "up" mean "more".

The sampler interpolates in straight lines between nodes and ignores the
edge curvature the editor draws. A strongly curved edge therefore modulates
differently from how it looks on screen.

The table is rebuilt whenever the shape or the rate changes. A graph with a
gap (an x position no edge covers) is malformed and the build fails rather
than producing a table with holes.


Rate Menu
---------

The rate knob picks from musically useful divisions of one second instead
of a continuous range:

    knob   0.0                                                      1.0
    div    1    1/2   1/3   1/4   1/6   1/8   1/12   1/16
    ms     1000 500   333   250   167   125   83     63
*/

/// Divisions of one second the rate knob steps through.
pub const LFO_DIVISIONS: [u32; 8] = [1, 2, 3, 4, 6, 8, 12, 16];

fn division_index(normalized: f32) -> usize {
    let last = LFO_DIVISIONS.len() - 1;
    ((normalized.clamp(0.0, 1.0) * last as f32).round() as usize).min(last)
}

/// Period in whole milliseconds for a normalized rate knob value.
pub fn lfo_rate_ms(normalized: f32) -> usize {
    (1000.0 / LFO_DIVISIONS[division_index(normalized)] as f32).round() as usize
}

/// Display text for the rate knob, e.g. "1" or "1 / 8".
pub fn rate_label(normalized: f32) -> String {
    match LFO_DIVISIONS[division_index(normalized)] {
        1 => "1".to_string(),
        d => format!("1 / {d}"),
    }
}

/// One LFO period sampled at 1 ms resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct LfoTable {
    samples: Vec<f32>,
}

impl LfoTable {
    /// Sample `graph` across a period of `period_ms` milliseconds.
    pub fn build(graph: &CurveGraph, period_ms: usize) -> Result<Self, CurveError> {
        let period_ms = period_ms.max(1);

        // resolve every edge once; a dangling edge is a malformed graph
        let segments = graph
            .edges()
            .iter()
            .map(|edge| Ok((*graph.node(edge.source)?, *graph.node(edge.target)?)))
            .collect::<Result<Vec<(CurveNode, CurveNode)>, CurveError>>()?;

        let samples = (0..period_ms)
            .map(|i| {
                let ratio = i as f32 / period_ms as f32;
                sample_segments(&segments, ratio)
            })
            .collect::<Result<Vec<f32>, CurveError>>()?;

        Ok(Self { samples })
    }

    pub fn period_ms(&self) -> usize {
        self.samples.len()
    }

    /// Value at `tick_ms`, wrapping around the period.
    #[inline]
    pub fn value_at(&self, tick_ms: usize) -> f32 {
        self.samples[tick_ms % self.samples.len()]
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

fn sample_segments(segments: &[(CurveNode, CurveNode)], ratio: f32) -> Result<f32, CurveError> {
    let (source, target) = segments
        .iter()
        .find(|(s, t)| s.x.min(t.x) <= ratio && ratio <= s.x.max(t.x))
        .ok_or(CurveError::EdgeNotCovering { ratio })?;

    let span = target.x - source.x;
    let t = if span == 0.0 {
        0.0
    } else {
        (ratio - source.x) / span
    };

    let from = 1.0 - source.y;
    let to = 1.0 - target.y;
    Ok(from + (to - from) * t)
}
