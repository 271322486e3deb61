/*
AHDSR Envelope
==============

Each voice owns one envelope. Unlike a per-sample ramp generator, the weight
here is a pure function of time: given how long the note has been held (and,
after note-off, how long it has been releasing) the state machine reports
the weight directly. That keeps the engine free of accumulated drift and lets
the timings change between blocks (LFO modulation) without glitching the
bookkeeping.

Vocabulary
----------

  weight      The envelope's output (0.0 to 1.0). Multiplies the voice's
              summed oscillator output.

  stage       Attack, Hold, Decay, Sustain, Release, or Done.

  elapsed     Milliseconds since note-on, measured on the sample clock.


The Shape
---------

  Weight
    1.0 ┐   ╱‾‾‾‾╲
        │  ╱      ╲_________
    S   │ ╱                 ╲
        │╱                   ╲
    0.0 └─────────────────────╲──→ Time
         A   H   D    S        R

  Attack   weight = elapsed / attack          (attack == 0 → 1 at once)
  Hold     weight = 1                         for hold ms
  Decay    weight = lerp(1, S, t / decay)     (decay == 0 → S at once)
  Sustain  weight = S                         until note-off
  Release  weight = W0 * (1 - t / release)    W0 = weight at note-off

Note-off enters Release from any stage. W0 is evaluated from the gate
curve at the moment of release, so a note released during attack fades from
wherever the attack had reached. Done is terminal: the voice is evicted.
*/

/// Current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Hold,
    Decay,
    Sustain,
    Release,
    Done,
}

/// Phase durations in milliseconds plus the (un-inverted) sustain level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeTimings {
    pub attack_ms: f32,
    pub hold_ms: f32,
    pub decay_ms: f32,
    pub sustain: f32,
    pub release_ms: f32,
}

impl EnvelopeTimings {
    /// Stage and weight while the gate is held, `elapsed_ms` after note-on.
    pub fn gate_weight(&self, elapsed_ms: f64) -> (EnvelopeStage, f32) {
        let attack = self.attack_ms.max(0.0) as f64;
        let hold_end = attack + self.hold_ms.max(0.0) as f64;
        let decay = self.decay_ms.max(0.0) as f64;

        if elapsed_ms < attack {
            // attack > 0 here, the division is safe
            return (EnvelopeStage::Attack, (elapsed_ms / attack) as f32);
        }
        if elapsed_ms < hold_end {
            return (EnvelopeStage::Hold, 1.0);
        }
        if elapsed_ms < hold_end + decay {
            let ratio = ((elapsed_ms - hold_end) / decay).min(1.0) as f32;
            return (EnvelopeStage::Decay, 1.0 + (self.sustain - 1.0) * ratio);
        }
        (EnvelopeStage::Sustain, self.sustain)
    }

    /// Fraction of the release-start weight left `since_release_ms` after note-off.
    pub fn release_gain(&self, since_release_ms: f64) -> f32 {
        if self.release_ms <= 0.0 {
            return 0.0;
        }
        (1.0 - since_release_ms / self.release_ms as f64).clamp(0.0, 1.0) as f32
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvelopeEngine {
    stage: EnvelopeStage,
    weight: f32,                // last computed weight
    released_at_ms: Option<f64>, // elapsed time at note-off
    release_level: f32,          // weight when release began
}

impl Default for EnvelopeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeEngine {
    /// A fresh envelope, entering Attack.
    pub fn new() -> Self {
        Self {
            stage: EnvelopeStage::Attack,
            weight: 0.0,
            released_at_ms: None,
            release_level: 0.0,
        }
    }

    /// Restart from Attack (re-trigger).
    pub fn trigger(&mut self) {
        *self = Self::new();
    }

    /// Gate low at `elapsed_ms` after note-on. Ignored once releasing.
    pub fn release(&mut self, elapsed_ms: f64, timings: &EnvelopeTimings) {
        if matches!(self.stage, EnvelopeStage::Release | EnvelopeStage::Done) {
            return;
        }
        let (_, level) = timings.gate_weight(elapsed_ms);
        self.release_level = level;
        self.released_at_ms = Some(elapsed_ms);
        self.stage = EnvelopeStage::Release;
    }

    /// Weight at `elapsed_ms` after note-on; advances the stage.
    pub fn weight_at(&mut self, elapsed_ms: f64, timings: &EnvelopeTimings) -> f32 {
        self.weight = match (self.stage, self.released_at_ms) {
            (EnvelopeStage::Done, _) => 0.0,
            (_, Some(released_at)) => {
                let since = (elapsed_ms - released_at).max(0.0);
                let weight = self.release_level * timings.release_gain(since);
                if weight <= 0.0 {
                    self.stage = EnvelopeStage::Done;
                }
                weight.max(0.0)
            }
            (_, None) => {
                let (stage, weight) = timings.gate_weight(elapsed_ms);
                self.stage = stage;
                weight
            }
        };

        debug_assert!((0.0..=1.0).contains(&self.weight));
        self.weight
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Last computed weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_releasing(&self) -> bool {
        self.released_at_ms.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.stage == EnvelopeStage::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timings(attack: f32, hold: f32, decay: f32, sustain: f32, release: f32) -> EnvelopeTimings {
        EnvelopeTimings {
            attack_ms: attack,
            hold_ms: hold,
            decay_ms: decay,
            sustain,
            release_ms: release,
        }
    }

    #[test]
    fn zero_attack_is_full_weight_immediately() {
        let t = timings(0.0, 0.0, 50.0, 0.5, 100.0);
        let mut env = EnvelopeEngine::new();
        assert_eq!(env.weight_at(0.0, &t), 1.0);
    }

    #[test]
    fn walks_through_every_gate_stage() {
        let t = timings(10.0, 5.0, 20.0, 0.4, 30.0);
        let mut env = EnvelopeEngine::new();

        assert!((env.weight_at(5.0, &t) - 0.5).abs() < 1e-6);
        assert_eq!(env.stage(), EnvelopeStage::Attack);

        assert_eq!(env.weight_at(12.0, &t), 1.0);
        assert_eq!(env.stage(), EnvelopeStage::Hold);

        // halfway through decay: lerp(1, 0.4, 0.5) = 0.7
        assert!((env.weight_at(25.0, &t) - 0.7).abs() < 1e-6);
        assert_eq!(env.stage(), EnvelopeStage::Decay);

        assert!((env.weight_at(500.0, &t) - 0.4).abs() < 1e-6);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
    }

    #[test]
    fn zero_decay_jumps_to_sustain() {
        let t = timings(0.0, 0.0, 0.0, 0.25, 10.0);
        let mut env = EnvelopeEngine::new();
        assert_eq!(env.weight_at(0.0, &t), 0.25);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
    }

    #[test]
    fn release_during_attack_starts_from_current_weight() {
        let t = timings(100.0, 0.0, 10.0, 0.5, 40.0);
        let mut env = EnvelopeEngine::new();
        env.release(25.0, &t);
        assert!((env.weight_at(25.0, &t) - 0.25).abs() < 1e-6);
        assert!((env.weight_at(45.0, &t) - 0.125).abs() < 1e-6);
    }

    #[test]
    fn release_is_monotonic_and_finishes_on_time() {
        let t = timings(0.0, 10.0, 10.0, 0.8, 100.0);
        let mut env = EnvelopeEngine::new();
        env.release(50.0, &t);

        let mut previous = f32::MAX;
        for step in 0..=200 {
            let elapsed = 50.0 + step as f64 * 0.5;
            let weight = env.weight_at(elapsed, &t);
            assert!(weight <= previous, "weight rose at {elapsed} ms");
            previous = weight;
        }
        assert_eq!(env.weight_at(150.0, &t), 0.0);
        assert!(env.is_done());
    }

    #[test]
    fn zero_release_finishes_immediately() {
        let t = timings(0.0, 0.0, 0.0, 1.0, 0.0);
        let mut env = EnvelopeEngine::new();
        env.release(3.0, &t);
        assert_eq!(env.weight_at(3.0, &t), 0.0);
        assert_eq!(env.stage(), EnvelopeStage::Done);
    }

    #[test]
    fn trigger_restarts_attack() {
        let t = timings(10.0, 0.0, 0.0, 1.0, 10.0);
        let mut env = EnvelopeEngine::new();
        env.release(20.0, &t);
        env.weight_at(40.0, &t);
        assert!(env.is_done());

        env.trigger();
        assert_eq!(env.stage(), EnvelopeStage::Attack);
        assert!(!env.is_releasing());
        assert!((env.weight_at(5.0, &t) - 0.5).abs() < 1e-6);
    }
}
