use crate::{
    dsp::{
        envelope::{EnvelopeEngine, EnvelopeTimings},
        oscillator::{UnisonOscillator, Wavetable},
    },
    synth::params::RuntimeParams,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Gate held
    Releasing, // Note-off received, envelope in release
}

/// One sounding pitch: two oscillators through one envelope.
///
/// Time is the engine's frame clock. A frame counts as elapsed once it has
/// played, so the first frame after note-on sits one frame into the attack.
#[derive(Debug, Clone)]
pub struct Voice {
    frequency: f32,
    state: VoiceState,
    started_at: u64, // frame clock at note-on
    ms_per_frame: f64,
    envelope: EnvelopeEngine,
    oscillators: [UnisonOscillator; 2],
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frequency: 0.0,
            state: VoiceState::Free,
            started_at: 0,
            ms_per_frame: 1000.0 / sample_rate as f64,
            envelope: EnvelopeEngine::new(),
            oscillators: [UnisonOscillator::new(); 2],
        }
    }

    /// Note-on. Always starts over from Attack, even if the slot was sounding.
    pub fn start(&mut self, frequency: f32, clock: u64) {
        self.frequency = frequency;
        self.state = VoiceState::Active;
        self.started_at = clock;
        self.envelope.trigger();
        for osc in &mut self.oscillators {
            osc.reset();
        }
    }

    /// Note-off at `clock`. The voice keeps sounding through its release.
    pub fn release(&mut self, clock: u64, timings: &EnvelopeTimings) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.envelope.release(self.elapsed_ms(clock), timings);
        }
    }

    /// Accumulate this voice into `left`/`right`, whose first frame is at `clock`.
    pub fn render(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        clock: u64,
        params: &RuntimeParams,
        tables: [Option<&Wavetable>; 2],
        sample_rate: f32,
    ) {
        for (osc, (table, p)) in self
            .oscillators
            .iter_mut()
            .zip(tables.iter().zip(&params.oscillators))
        {
            if let Some(table) = table {
                osc.prepare(self.frequency, p, table.len(), sample_rate);
            }
        }

        for (i, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
            let mut mix = (0.0, 0.0);
            for (osc, (table, p)) in self
                .oscillators
                .iter_mut()
                .zip(tables.iter().zip(&params.oscillators))
            {
                // disabled or unplayable oscillators are silent
                if let (Some(table), true) = (table, p.enabled) {
                    let (a, b) = osc.next_frame(table, p);
                    mix.0 += a;
                    mix.1 += b;
                }
            }

            let elapsed = self.elapsed_ms(clock + i as u64);
            let weight = self.envelope.weight_at(elapsed, &params.envelope);
            *l += mix.0 * weight;
            *r += mix.1 * weight;

            if self.envelope.is_done() {
                break;
            }
        }
    }

    fn elapsed_ms(&self, clock: u64) -> f64 {
        (clock + 1).saturating_sub(self.started_at) as f64 * self.ms_per_frame
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.frequency = 0.0;
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    /// Envelope reached Done; the slot can be reclaimed.
    pub fn is_finished(&self) -> bool {
        self.is_active() && self.envelope.is_done()
    }

    /// Same pitch, compared bit for bit.
    pub fn plays(&self, frequency: f32) -> bool {
        self.is_active() && self.frequency.to_bits() == frequency.to_bits()
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn envelope(&self) -> &EnvelopeEngine {
        &self.envelope
    }
}
