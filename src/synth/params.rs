//! Control-side configuration and the immutable snapshot handed to the engine.
//!
//! Every knob value is normalized to `[0, 1]`. The engine never sees the
//! mutable configuration: the control layer builds a [`ParameterSnapshot`]
//! (rendering wavetables on the way) and sends it over the message channel.
//! Per block the engine resolves the snapshot plus the latest LFO frame into
//! [`RuntimeParams`], a small `Copy` struct in engine units.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    curve::CurveGraph,
    dsp::{
        envelope::EnvelopeTimings,
        oscillator::{Waveform, Wavetable, MAX_UNISON, WAVETABLE_LENGTH},
    },
    synth::modulation::ModulationFrame,
};

pub const MIN_ENVELOPE_MS: f32 = 0.01;
pub const MAX_ENVELOPE_MS: f32 = 3000.0;

/// Normalized knob value → milliseconds.
#[inline]
pub fn denormalized_ms(normalized: f32) -> f32 {
    MIN_ENVELOPE_MS + (MAX_ENVELOPE_MS - MIN_ENVELOPE_MS) * normalized
}

/// Normalized knob value → number of unison voices (1..=16).
#[inline]
pub fn denormalized_unison(normalized: f32) -> usize {
    let count = (normalized.clamp(0.0, 1.0) * (MAX_UNISON - 1) as f32).floor() as usize + 1;
    count.min(MAX_UNISON)
}

/// Normalized level → decibels on a -60 dB .. 0 dB amplitude scale.
pub fn denormalized_audio_level_db(normalized: f32) -> f32 {
    let min_level = 10.0_f32.powf(-60.0 / 20.0);
    let max_level = 1.0;
    let level = min_level + (max_level - min_level) * normalized.clamp(0.0, 1.0);
    20.0 * level.log10()
}

/// One envelope phase as edited: duration `x`, level `y`, and curvature.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnvelopeData {
    pub x: f32,
    pub y: f32,
    pub curve_x: f32,
    pub curve_y: f32,
}

impl EnvelopeData {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            curve_x: 0.0,
            curve_y: 0.0,
        }
    }
}

/// Attack/hold/decay/release. `decay.y` is the sustain level, stored inverted.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: EnvelopeData,
    pub hold: EnvelopeData,
    pub decay: EnvelopeData,
    pub release: EnvelopeData,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: EnvelopeData::new(0.0, 0.0),
            hold: EnvelopeData::new(0.1, 0.0),
            decay: EnvelopeData::new(0.3, 0.7),
            release: EnvelopeData::new(0.5, 0.0),
        }
    }
}

impl Envelope {
    /// Sustain level as the engine uses it (un-inverted).
    pub fn sustain(&self) -> f32 {
        1.0 - self.decay.y
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub unison: f32,
    pub detune: f32,
    pub pan: f32, // 0.5 is centre
    pub level: f32,
    pub enabled: bool,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            unison: 0.0,
            detune: 0.0,
            pan: 0.5,
            level: 1.0,
            enabled: true,
        }
    }
}

impl Oscillator {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Render the wavetable and freeze the knob values for the engine.
    pub fn to_params(&self) -> OscillatorParams {
        OscillatorParams {
            wavetable: Wavetable::from_waveform(&self.waveform, WAVETABLE_LENGTH),
            unison: self.unison,
            detune: self.detune,
            pan: self.pan,
            level: self.level,
            enabled: self.enabled,
        }
    }
}

/// Filter knobs. The engine passes audio through untouched; these exist as
/// snapshot state and LFO destinations.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Filter {
    pub cutoff: f32,
    pub resonance: f32,
    pub drive: f32,
    pub mix: f32,
    pub pan: f32,
    pub enabled: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            cutoff: 0.0,
            resonance: 0.0,
            drive: 0.0,
            mix: 0.0,
            pan: 0.0,
            enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lfo {
    pub graph: CurveGraph,
    pub rate: f32,
    pub attachments: DestinationSet,
}

impl Default for Lfo {
    fn default() -> Self {
        Self {
            graph: CurveGraph::default_lfo(),
            rate: 0.0,
            attachments: DestinationSet::empty(),
        }
    }
}

impl Lfo {
    /// Attach `destination`, or detach it if already attached.
    pub fn toggle_attachment(&mut self, destination: Destination) {
        if self.attachments.contains(destination) {
            self.attachments.remove(destination);
        } else {
            self.attachments.insert(destination);
        }
    }
}

/// The whole synth configuration as the control layer edits it.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthState {
    pub master: f32,
    pub oscillator1: Oscillator,
    pub oscillator2: Oscillator,
    pub filter: Filter,
    pub lfo: Lfo,
    pub envelope: Envelope,
}

impl Default for SynthState {
    fn default() -> Self {
        Self {
            master: 0.1,
            oscillator1: Oscillator::default(),
            oscillator2: Oscillator::disabled(),
            filter: Filter::default(),
            lfo: Lfo::default(),
            envelope: Envelope::default(),
        }
    }
}

impl SynthState {
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            master: self.master,
            oscillator1: self.oscillator1.to_params(),
            oscillator2: self.oscillator2.to_params(),
            envelope: self.envelope,
            filter: self.filter,
        }
    }
}

/// Engine-side view of one oscillator, read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorParams {
    /// `None` for an unsupported or empty waveform; the oscillator is silent.
    pub wavetable: Option<Wavetable>,
    pub unison: f32,
    pub detune: f32,
    pub pan: f32,
    pub level: f32,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSnapshot {
    pub master: f32,
    pub oscillator1: OscillatorParams,
    pub oscillator2: OscillatorParams,
    pub envelope: Envelope,
    pub filter: Filter,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        SynthState::default().snapshot()
    }
}

impl ParameterSnapshot {
    pub fn oscillator(&self, index: usize) -> &OscillatorParams {
        if index == 0 {
            &self.oscillator1
        } else {
            &self.oscillator2
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorParam {
    Unison,
    Detune,
    Level,
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterParam {
    Cutoff,
    Resonance,
    Drive,
    Mix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeParam {
    Attack,
    Hold,
    Decay,
    Sustain,
    Release,
}

/// A parameter an LFO can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Oscillator { index: u8, param: OscillatorParam },
    Filter(FilterParam),
    Envelope(EnvelopeParam),
}

impl Destination {
    const OSC_PARAMS: [OscillatorParam; 4] = [
        OscillatorParam::Unison,
        OscillatorParam::Detune,
        OscillatorParam::Level,
        OscillatorParam::Pan,
    ];
    const FILTER_PARAMS: [FilterParam; 4] = [
        FilterParam::Cutoff,
        FilterParam::Resonance,
        FilterParam::Drive,
        FilterParam::Mix,
    ];
    const ENVELOPE_PARAMS: [EnvelopeParam; 5] = [
        EnvelopeParam::Attack,
        EnvelopeParam::Hold,
        EnvelopeParam::Decay,
        EnvelopeParam::Sustain,
        EnvelopeParam::Release,
    ];

    pub const COUNT: usize = 17;

    /// Stable bit position inside a [`DestinationSet`].
    pub fn bit(self) -> u32 {
        match self {
            Destination::Oscillator { index, param } => {
                let offset = Self::OSC_PARAMS.iter().position(|p| *p == param).unwrap_or(0);
                (index.min(1) as u32) * 4 + offset as u32
            }
            Destination::Filter(param) => {
                8 + Self::FILTER_PARAMS.iter().position(|p| *p == param).unwrap_or(0) as u32
            }
            Destination::Envelope(param) => {
                12 + Self::ENVELOPE_PARAMS.iter().position(|p| *p == param).unwrap_or(0) as u32
            }
        }
    }

    pub fn from_bit(bit: u32) -> Option<Self> {
        let bit = bit as usize;
        match bit {
            0..=7 => Some(Destination::Oscillator {
                index: (bit / 4) as u8,
                param: Self::OSC_PARAMS[bit % 4],
            }),
            8..=11 => Some(Destination::Filter(Self::FILTER_PARAMS[bit - 8])),
            12..=16 => Some(Destination::Envelope(Self::ENVELOPE_PARAMS[bit - 12])),
            _ => None,
        }
    }
}

/// Set of attached destinations, packed so modulation frames stay `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DestinationSet(u32);

impl DestinationSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, destination: Destination) {
        self.0 |= 1 << destination.bit();
    }

    pub fn remove(&mut self, destination: Destination) {
        self.0 &= !(1 << destination.bit());
    }

    pub fn contains(&self, destination: Destination) -> bool {
        self.0 & (1 << destination.bit()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Destination> + '_ {
        (0..Destination::COUNT as u32)
            .filter(move |bit| self.0 & (1 << bit) != 0)
            .filter_map(Destination::from_bit)
    }
}

impl FromIterator<Destination> for DestinationSet {
    fn from_iter<I: IntoIterator<Item = Destination>>(iter: I) -> Self {
        let mut set = Self::empty();
        for destination in iter {
            set.insert(destination);
        }
        set
    }
}

/// Resolved once per block on the render thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorRuntime {
    pub unison: usize,
    pub detune: f32,
    pub pan: f32,
    pub level: f32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterRuntime {
    pub cutoff: f32,
    pub resonance: f32,
    pub drive: f32,
    pub mix: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeParams {
    pub master: f32,
    pub oscillators: [OscillatorRuntime; 2],
    pub envelope: EnvelopeTimings,
    pub filter: FilterRuntime,
}

impl RuntimeParams {
    /// Snapshot values with the LFO frame's overrides applied for this tick.
    /// The snapshot itself is never touched.
    pub fn resolve(snapshot: &ParameterSnapshot, frame: Option<&ModulationFrame>) -> Self {
        let mut oscillators = [snapshot.oscillator(0), snapshot.oscillator(1)].map(|osc| {
            // unison stays normalized until every override has landed
            (osc.unison, OscillatorRuntime {
                unison: 1,
                detune: osc.detune,
                pan: osc.pan,
                level: osc.level,
                enabled: osc.enabled,
            })
        });

        let env = &snapshot.envelope;
        let mut attack = env.attack.x;
        let mut hold = env.hold.x;
        let mut decay = env.decay.x;
        let mut sustain = env.sustain();
        let mut release = env.release.x;

        let mut filter = FilterRuntime {
            cutoff: snapshot.filter.cutoff,
            resonance: snapshot.filter.resonance,
            drive: snapshot.filter.drive,
            mix: snapshot.filter.mix,
        };

        if let Some(frame) = frame {
            let value = frame.value;
            for destination in frame.targets.iter() {
                match destination {
                    Destination::Oscillator { index, param } => {
                        let (unison, osc) = &mut oscillators[index.min(1) as usize];
                        match param {
                            OscillatorParam::Unison => *unison = value,
                            OscillatorParam::Detune => osc.detune = value,
                            OscillatorParam::Level => osc.level = value,
                            OscillatorParam::Pan => osc.pan = value,
                        }
                    }
                    Destination::Filter(param) => match param {
                        FilterParam::Cutoff => filter.cutoff = value,
                        FilterParam::Resonance => filter.resonance = value,
                        FilterParam::Drive => filter.drive = value,
                        FilterParam::Mix => filter.mix = value,
                    },
                    Destination::Envelope(param) => match param {
                        EnvelopeParam::Attack => attack = value,
                        EnvelopeParam::Hold => hold = value,
                        EnvelopeParam::Decay => decay = value,
                        EnvelopeParam::Sustain => sustain = value,
                        EnvelopeParam::Release => release = value,
                    },
                }
            }
        }

        let oscillators = oscillators.map(|(unison, mut osc)| {
            osc.unison = denormalized_unison(unison);
            osc
        });

        Self {
            master: snapshot.master,
            oscillators,
            envelope: EnvelopeTimings {
                attack_ms: denormalized_ms(attack),
                hold_ms: denormalized_ms(hold),
                decay_ms: denormalized_ms(decay),
                sustain: sustain.clamp(0.0, 1.0),
                release_ms: denormalized_ms(release),
            },
            filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knob_mappings_hit_their_endpoints() {
        assert!((denormalized_ms(0.0) - 0.01).abs() < 1e-6);
        assert!((denormalized_ms(1.0) - 3000.0).abs() < 1e-3);
        assert_eq!(denormalized_unison(0.0), 1);
        assert_eq!(denormalized_unison(1.0), 16);
        assert_eq!(denormalized_unison(0.5), 8);
        assert!((denormalized_audio_level_db(1.0)).abs() < 1e-4);
        assert!((denormalized_audio_level_db(0.0) + 60.0).abs() < 1e-3);
    }

    #[test]
    fn destination_bits_are_unique_and_reversible() {
        let mut seen = 0u32;
        for bit in 0..Destination::COUNT as u32 {
            let destination = Destination::from_bit(bit).unwrap();
            assert_eq!(destination.bit(), bit);
            seen |= 1 << bit;
        }
        assert_eq!(seen.count_ones() as usize, Destination::COUNT);
        assert!(Destination::from_bit(Destination::COUNT as u32).is_none());
    }

    #[test]
    fn toggling_attachment_adds_then_removes() {
        let mut lfo = Lfo::default();
        let cutoff = Destination::Filter(FilterParam::Cutoff);
        lfo.toggle_attachment(cutoff);
        assert!(lfo.attachments.contains(cutoff));
        lfo.toggle_attachment(cutoff);
        assert!(lfo.attachments.is_empty());
    }

    #[test]
    fn sustain_is_uninverted_for_the_engine() {
        let snapshot = ParameterSnapshot::default();
        let runtime = RuntimeParams::resolve(&snapshot, None);
        assert!((runtime.envelope.sustain - 0.3).abs() < 1e-6);
        assert!((runtime.envelope.hold_ms - denormalized_ms(0.1)).abs() < 1e-3);
    }

    #[test]
    fn modulation_overrides_only_attached_values() {
        let snapshot = ParameterSnapshot::default();
        let targets: DestinationSet = [
            Destination::Oscillator {
                index: 0,
                param: OscillatorParam::Level,
            },
            Destination::Envelope(EnvelopeParam::Release),
        ]
        .into_iter()
        .collect();
        let frame = ModulationFrame {
            value: 0.25,
            targets,
        };

        let runtime = RuntimeParams::resolve(&snapshot, Some(&frame));
        assert_eq!(runtime.oscillators[0].level, 0.25);
        assert_eq!(runtime.oscillators[1].level, 1.0);
        assert!((runtime.envelope.release_ms - denormalized_ms(0.25)).abs() < 1e-3);
        assert!((runtime.envelope.hold_ms - denormalized_ms(0.1)).abs() < 1e-3);

        // the snapshot keeps the user value
        assert_eq!(snapshot.oscillator1.level, 1.0);
    }
}
