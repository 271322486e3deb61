use std::f32::consts::TAU;

use rand::{rngs::StdRng, Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::synth::params::OscillatorRuntime;

/*
Wavetable Oscillator with Unison
================================

Every oscillator reads a single-cycle wavetable. Pitch comes from how fast
the read pointer moves through the table:

    increment = frequency * table_length / sample_rate

The pointer wraps modulo the table length and the sample under it is read
without interpolation (floor). Cheap, and at the table sizes used here the
aliasing is part of the instrument's character.

Unison
------

Unison plays U copies of the same table, each slightly detuned, and averages
them. The copies are spread symmetrically around the base pitch:

    step(u)  = (u - (U - 1) / 2) / max(1, (U - 1) / 2)      in [-1, 1]
    ratio(u) = 2 ^ (MAX_DETUNE_CENTS * detune * step(u) / 1200)

With U = 1 the only copy sits at step 0, so detune has no effect. For any U
the steps sum to zero, so the spread is centred on the played note.
Centring on floor(U / 2) instead would leave every even U biased flat, with
the top copy missing its mirror.

    U = 3:   -1     0    +1
    U = 4:   -1  -1/3  +1/3  +1

Level and Pan
-------------

After summing, the mono result is scaled by level and split with a linear
pan law (pan in 0..1, centre 0.5):

    left  = pan <= 0.5 ? 1 : 2 * (1 - pan)
    right = pan >= 0.5 ? 1 : 2 * pan

At centre both sides get full gain.
*/

pub const WAVETABLE_LENGTH: usize = 1024;
pub const MAX_UNISON: usize = 16;
pub const MAX_DETUNE_CENTS: f32 = 50.0;

/// Waveform source for an oscillator, as the control layer selects it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "data", rename_all = "lowercase")
)]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
    Noise,
    /// Hand-drawn single cycle from the wave editor.
    Table(Vec<f32>),
    /// Anything the engine does not know how to play.
    #[cfg_attr(feature = "serde", serde(other))]
    Unsupported,
}

/// A rendered single-cycle table. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Wavetable {
    samples: Vec<f32>,
}

impl Wavetable {
    /// Wrap drawn samples. `None` when empty or not finite.
    pub fn from_samples(samples: Vec<f32>) -> Option<Self> {
        if samples.is_empty() || samples.iter().any(|s| !s.is_finite()) {
            return None;
        }
        Some(Self { samples })
    }

    /// Render `waveform` into `length` samples. `None` means the oscillator
    /// should stay silent.
    pub fn from_waveform(waveform: &Waveform, length: usize) -> Option<Self> {
        if length == 0 {
            return None;
        }
        let phase = |i: usize| i as f32 / length as f32;

        let samples: Vec<f32> = match waveform {
            Waveform::Sine => (0..length).map(|i| (TAU * phase(i)).sin()).collect(),
            Waveform::Square => (0..length)
                .map(|i| if phase(i) < 0.5 { 1.0 } else { -1.0 })
                .collect(),
            Waveform::Sawtooth => (0..length).map(|i| 2.0 * phase(i) - 1.0).collect(),
            Waveform::Triangle => (0..length)
                .map(|i| 1.0 - 4.0 * (phase(i) - 0.5).abs())
                .collect(),
            Waveform::Noise => {
                // fixed seed so the same patch always renders the same table
                let mut rng = StdRng::seed_from_u64(0x5EED);
                (0..length).map(|_| rng.gen_range(-1.0..=1.0)).collect()
            }
            Waveform::Table(samples) => samples.clone(),
            Waveform::Unsupported => return None,
        };

        Self::from_samples(samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample under a read pointer, wrapping and flooring.
    #[inline]
    pub fn read(&self, position: f32) -> f32 {
        let index = position.max(0.0) as usize % self.samples.len();
        self.samples[index]
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

/// Signed spread position of sub-voice `u` out of `unison`, in `[-1, 1]`.
#[inline]
pub fn detune_step(u: usize, unison: usize) -> f32 {
    let centre = (unison.max(1) - 1) as f32 / 2.0;
    (u as f32 - centre) / centre.max(1.0)
}

/// Frequency ratio for a sub-voice at `step` with normalized `detune`.
#[inline]
pub fn detune_ratio(step: f32, detune: f32) -> f32 {
    2.0_f32.powf(MAX_DETUNE_CENTS * detune * step / 1200.0)
}

/// Linear pan gains `(left, right)` for pan in `0..1`.
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(0.0, 1.0);
    let left = if pan <= 0.5 { 1.0 } else { 2.0 * (1.0 - pan) };
    let right = if pan >= 0.5 { 1.0 } else { 2.0 * pan };
    (left, right)
}

/// Per-voice playback state for one oscillator: a read pointer per unison copy.
#[derive(Debug, Clone, Copy)]
pub struct UnisonOscillator {
    positions: [f32; MAX_UNISON],
    increments: [f32; MAX_UNISON],
    active: usize,
}

impl Default for UnisonOscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl UnisonOscillator {
    pub fn new() -> Self {
        Self {
            positions: [0.0; MAX_UNISON],
            increments: [0.0; MAX_UNISON],
            active: 1,
        }
    }

    /// Rewind every read pointer (note-on).
    pub fn reset(&mut self) {
        self.positions = [0.0; MAX_UNISON];
    }

    /// Compute per-copy increments for the coming block.
    pub fn prepare(
        &mut self,
        frequency: f32,
        params: &OscillatorRuntime,
        table_length: usize,
        sample_rate: f32,
    ) {
        self.active = params.unison.clamp(1, MAX_UNISON);
        let base = frequency * table_length as f32 / sample_rate;

        for u in 0..self.active {
            let step = detune_step(u, self.active);
            self.increments[u] = base * detune_ratio(step, params.detune);
        }
    }

    /// One stereo frame: averaged unison copies, then level and pan.
    #[inline]
    pub fn next_frame(&mut self, table: &Wavetable, params: &OscillatorRuntime) -> (f32, f32) {
        let length = table.len() as f32;
        let scale = 1.0 / self.active as f32;
        let mut sum = 0.0;

        for u in 0..self.active {
            sum += table.read(self.positions[u]) * scale;
            self.positions[u] = (self.positions[u] + self.increments[u]) % length;
        }

        let (left_gain, right_gain) = pan_gains(params.pan);
        let out = sum * params.level;
        (out * left_gain, out * right_gain)
    }

    pub fn active_copies(&self) -> usize {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(unison: usize, detune: f32, pan: f32) -> OscillatorRuntime {
        OscillatorRuntime {
            unison,
            detune,
            pan,
            level: 1.0,
            enabled: true,
        }
    }

    #[test]
    fn single_voice_has_no_spread() {
        assert_eq!(detune_step(0, 1), 0.0);
        for &detune in &[0.0, 0.3, 1.0] {
            assert_eq!(detune_ratio(detune_step(0, 1), detune), 1.0);
        }
    }

    #[test]
    fn detune_steps_are_centred() {
        for unison in 2..=MAX_UNISON {
            let sum: f32 = (0..unison).map(|u| detune_step(u, unison)).sum();
            assert!(sum.abs() < 1e-4, "unison {unison} sums to {sum}");
            assert!((detune_step(0, unison) + 1.0).abs() < 1e-6);
            assert!((detune_step(unison - 1, unison) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn full_detune_spans_fifty_cents() {
        let up = detune_ratio(1.0, 1.0);
        assert!((up - 2.0_f32.powf(50.0 / 1200.0)).abs() < 1e-6);
        assert!((detune_ratio(-1.0, 1.0) * up - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pan_law_is_linear_with_unity_centre() {
        assert_eq!(pan_gains(0.5), (1.0, 1.0));
        assert_eq!(pan_gains(0.0), (1.0, 0.0));
        assert_eq!(pan_gains(1.0), (0.0, 1.0));
        let (l, r) = pan_gains(0.75);
        assert!((l - 0.5).abs() < 1e-6);
        assert_eq!(r, 1.0);
    }

    #[test]
    fn unsupported_waveform_has_no_table() {
        assert!(Wavetable::from_waveform(&Waveform::Unsupported, 64).is_none());
        assert!(Wavetable::from_waveform(&Waveform::Table(vec![]), 64).is_none());
        assert!(Wavetable::from_samples(vec![0.0, f32::NAN]).is_none());
        assert_eq!(
            Wavetable::from_waveform(&Waveform::Square, 64).map(|t| t.len()),
            Some(64)
        );
    }

    #[test]
    fn read_pointer_advances_by_pitch_and_wraps() {
        // ramp table so the sample value reveals the index
        let table = Wavetable::from_samples((0..8).map(|i| i as f32).collect()).unwrap();
        let p = params(1, 0.0, 0.5);
        let mut osc = UnisonOscillator::new();
        // 3 table steps per sample
        osc.prepare(3.0, &p, table.len(), 8.0);

        let reads: Vec<f32> = (0..4).map(|_| osc.next_frame(&table, &p).0).collect();
        assert_eq!(reads, vec![0.0, 3.0, 6.0, 1.0]);
    }

    #[test]
    fn unison_copies_average_to_unit_level() {
        let table = Wavetable::from_samples(vec![1.0; 16]).unwrap();
        let p = params(7, 1.0, 0.5);
        let mut osc = UnisonOscillator::new();
        osc.prepare(440.0, &p, table.len(), 48_000.0);
        assert_eq!(osc.active_copies(), 7);

        let (l, r) = osc.next_frame(&table, &p);
        assert!((l - 1.0).abs() < 1e-5);
        assert!((r - 1.0).abs() < 1e-5);
    }

    #[test]
    fn sine_table_is_one_cycle() {
        let table = Wavetable::from_waveform(&Waveform::Sine, WAVETABLE_LENGTH).unwrap();
        assert!(table.samples()[0].abs() < 1e-6);
        assert!((table.samples()[WAVETABLE_LENGTH / 4] - 1.0).abs() < 1e-4);
    }
}
