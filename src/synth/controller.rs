use std::sync::Arc;

use rtrb::{Consumer, Producer};

use crate::{
    error::FaultKind,
    synth::{
        message::{EngineEvent, SynthMessage},
        params::{Lfo, SynthState},
    },
    SAMPLE_BUFFER_LENGTH,
};

/// The control-thread half of the engine.
///
/// Owns nothing the engine reads: every change leaves as a message. Sends
/// never block. A full ring drops the message and returns `false`.
pub struct SynthController {
    tx: Producer<SynthMessage>,
    lfo_tx: Producer<Lfo>,
    events: Consumer<EngineEvent>,
    samples: Box<[f32; SAMPLE_BUFFER_LENGTH]>,
}

impl SynthController {
    pub(crate) fn new(
        tx: Producer<SynthMessage>,
        lfo_tx: Producer<Lfo>,
        events: Consumer<EngineEvent>,
    ) -> Self {
        Self {
            tx,
            lfo_tx,
            events,
            samples: Box::new([0.0; SAMPLE_BUFFER_LENGTH]),
        }
    }

    fn send(&mut self, msg: SynthMessage) -> bool {
        match self.tx.push(msg) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("engine message ring full, message dropped");
                false
            }
        }
    }

    pub fn note_on(&mut self, frequency: f32) -> bool {
        self.send(SynthMessage::AddFrequency(frequency))
    }

    pub fn note_off(&mut self, frequency: f32) -> bool {
        self.send(SynthMessage::RemoveFrequency(frequency))
    }

    pub fn all_notes_off(&mut self) -> bool {
        self.send(SynthMessage::AllNotesOff)
    }

    /// Freeze `state` into a snapshot and hand it to the engine.
    ///
    /// The LFO settings go to the scheduler instead; the engine only ever
    /// sees their per-tick output.
    pub fn apply(&mut self, state: &SynthState) -> bool {
        let sent = self.send(SynthMessage::Snapshot(Arc::new(state.snapshot())));
        self.update_lfo(&state.lfo) && sent
    }

    pub fn update_lfo(&mut self, lfo: &Lfo) -> bool {
        match self.lfo_tx.push(lfo.clone()) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("lfo update ring full, update dropped");
                false
            }
        }
    }

    /// Process everything the engine reported since the last call.
    ///
    /// Keeps the newest sample buffer, frees retired snapshots, and logs and
    /// returns any faults.
    pub fn drain_events(&mut self) -> Vec<FaultKind> {
        let mut faults = Vec::new();
        while let Ok(event) = self.events.pop() {
            match event {
                EngineEvent::SampleBuffer(buffer) => *self.samples = buffer,
                EngineEvent::Fault(fault) => {
                    log::warn!("engine fault: {fault}");
                    faults.push(fault);
                }
                EngineEvent::Retired(snapshot) => drop(snapshot),
            }
        }
        faults
    }

    /// Most recent visualization buffer.
    pub fn samples(&self) -> &[f32; SAMPLE_BUFFER_LENGTH] {
        &self.samples
    }

    /// Largest absolute sample in the visualization buffer.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{channel, EngineConfig};

    #[test]
    fn full_ring_drops_and_reports() {
        let config = EngineConfig::default().with_channel_capacity(2);
        let (mut controller, _lfo, _engine) = channel(config);

        assert!(controller.note_on(440.0));
        assert!(controller.note_off(440.0));
        assert!(!controller.all_notes_off());
    }

    #[test]
    fn apply_feeds_engine_and_scheduler() {
        let (mut controller, mut lfo, _engine) = channel(EngineConfig::default());
        assert!(controller.apply(&SynthState::default()));
        // the default lfo shape is valid, so the scheduler starts ticking
        assert!(lfo.tick().is_some());
    }

    #[test]
    fn draining_with_nothing_reported() {
        let (mut controller, _, _) = channel(EngineConfig::default());
        assert!(controller.drain_events().is_empty());
        assert_eq!(controller.peak(), 0.0);
    }
}
