use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use rtrb::{Consumer, Producer};

use crate::{
    error::FaultKind,
    synth::{
        config::EngineConfig,
        message::{EngineEvent, SynthMessage, RETIRE_RESERVE},
        modulation::ModulationFrame,
        params::{ParameterSnapshot, RuntimeParams},
        voice::{Voice, VoiceState},
        SynthEngine,
    },
    SAMPLE_BUFFER_LENGTH,
};

/*
Render Loop
===========

The VoiceManager lives on the audio thread. Each call to `render_block`:

  1. Drains control messages in FIFO order. Snapshots swap wholesale here,
     never inside a block.
  2. Drains modulation frames, keeping only the newest.
  3. Resolves snapshot + frame into RuntimeParams (Copy, no allocation).
  4. Renders every sounding voice into the caller's buffers, then evicts
     voices whose envelope finished.
  5. Applies master gain and feeds the visualization buffer.

Steps 3-5 run under `catch_unwind`. A panic there silences the block, drops
every voice, and is reported as a Fault event.

A new snapshot is on probation until a block with sounding voices renders
cleanly under it. Until then the one it replaced is held as `last_good`. If
the block panics, `last_good` is swapped back in and the faulting snapshot is
retired, so the next note plays with parameters that are known to work.

Snapshots leave the render thread through `Retired` events and are freed on
the control side. The last RETIRE_RESERVE slots of the event ring are kept
for them.

All voice slots are allocated up front. Notes find a slot in this order:

  - a slot already playing the same frequency (restarted from Attack)
  - a free slot
  - the releasing voice that started earliest (stolen)

If none of those exist the note is dropped and VoicesExhausted is reported.
*/

pub struct VoiceManager {
    voices: Vec<Voice>,
    snapshot: Arc<ParameterSnapshot>,
    last_good: Option<Arc<ParameterSnapshot>>,
    modulation: Option<ModulationFrame>,
    rx: Consumer<SynthMessage>,
    modulation_rx: Consumer<ModulationFrame>,
    events: Producer<EngineEvent>,
    scope: [f32; SAMPLE_BUFFER_LENGTH],
    scope_index: usize,
    sample_rate: f32,
    frame_counter: u64,
}

impl VoiceManager {
    pub(crate) fn new(
        config: &EngineConfig,
        rx: Consumer<SynthMessage>,
        modulation_rx: Consumer<ModulationFrame>,
        events: Producer<EngineEvent>,
    ) -> Self {
        let voices = (0..config.max_voices)
            .map(|_| Voice::new(config.sample_rate))
            .collect();

        Self {
            voices,
            snapshot: Arc::new(ParameterSnapshot::default()),
            last_good: None,
            modulation: None,
            rx,
            modulation_rx,
            events,
            scope: [0.0; SAMPLE_BUFFER_LENGTH],
            scope_index: 0,
            sample_rate: config.sample_rate,
            frame_counter: 0,
        }
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.pop() {
            match msg {
                SynthMessage::AddFrequency(frequency) => self.note_on(frequency),
                SynthMessage::RemoveFrequency(frequency) => self.note_off(frequency),
                SynthMessage::Snapshot(snapshot) => self.configure(snapshot),
                SynthMessage::AllNotesOff => self.all_notes_off(),
            }
        }

        while let Ok(frame) = self.modulation_rx.pop() {
            self.modulation = Some(frame);
        }
    }

    fn allocate_voice(&mut self, frequency: f32) -> Option<&mut Voice> {
        if let Some(idx) = self.voices.iter().position(|v| v.plays(frequency)) {
            return Some(&mut self.voices[idx]);
        }

        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return Some(&mut self.voices[idx]);
        }

        let steal_idx = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.started_at())
            .map(|(idx, _)| idx);

        steal_idx.map(|idx| &mut self.voices[idx])
    }

    fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.free();
        }
    }

    fn runtime(&self) -> RuntimeParams {
        RuntimeParams::resolve(&self.snapshot, self.modulation.as_ref())
    }

    fn render_voices(&mut self, left: &mut [f32], right: &mut [f32]) {
        let runtime = self.runtime();
        let tables = [
            self.snapshot.oscillator1.wavetable.as_ref(),
            self.snapshot.oscillator2.wavetable.as_ref(),
        ];

        for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
            voice.render(
                left,
                right,
                self.frame_counter,
                &runtime,
                tables,
                self.sample_rate,
            );
            if voice.is_finished() {
                voice.free();
            }
        }

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            *l *= runtime.master;
            *r *= runtime.master;
        }

        for (l, r) in left.iter().zip(right.iter()) {
            self.scope[self.scope_index] = (l + r) / 2.0;
            self.scope_index += 1;
            if self.scope_index == SAMPLE_BUFFER_LENGTH {
                self.scope_index = 0;
                self.emit(EngineEvent::SampleBuffer(self.scope));
            }
        }
    }

    /// Lossy: a full ring drops the event. Everything except `Retired`
    /// stays out of the reserved slots.
    fn emit(&mut self, event: EngineEvent) {
        let reserved = !matches!(event, EngineEvent::Retired(_));
        if reserved && self.events.slots() <= RETIRE_RESERVE {
            return;
        }
        let _ = self.events.push(event);
    }

    /// The snapshot in use faulted: go back to the one before it.
    fn restore_last_good(&mut self) {
        if let Some(good) = self.last_good.take() {
            let faulted = std::mem::replace(&mut self.snapshot, good);
            self.emit(EngineEvent::Retired(faulted));
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn snapshot(&self) -> &ParameterSnapshot {
        &self.snapshot
    }

    /// Frames rendered since creation.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }
}

impl SynthEngine for VoiceManager {
    fn configure(&mut self, snapshot: Arc<ParameterSnapshot>) {
        let previous = std::mem::replace(&mut self.snapshot, snapshot);
        if self.last_good.is_none() {
            self.last_good = Some(previous);
        } else {
            // replaced before it was ever proven
            self.emit(EngineEvent::Retired(previous));
        }
    }

    fn note_on(&mut self, frequency: f32) {
        let clock = self.frame_counter;
        match self.allocate_voice(frequency) {
            Some(voice) => voice.start(frequency, clock),
            None => self.emit(EngineEvent::Fault(FaultKind::VoicesExhausted)),
        }
    }

    fn note_off(&mut self, frequency: f32) {
        let clock = self.frame_counter;
        let timings = self.runtime().envelope;
        if let Some(voice) = self
            .voices
            .iter_mut()
            .find(|v| v.plays(frequency) && v.state() == VoiceState::Active)
        {
            voice.release(clock, &timings);
        }
    }

    fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.drain_messages();

        let frames = left.len().min(right.len());
        let (left, right) = (&mut left[..frames], &mut right[..frames]);
        left.fill(0.0);
        right.fill(0.0);

        if self.voices.iter().all(|v| v.is_free()) {
            self.frame_counter += frames as u64;
            return;
        }

        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            self.render_voices(left, right);
        }));

        match rendered {
            Ok(()) => {
                if let Some(previous) = self.last_good.take() {
                    self.emit(EngineEvent::Retired(previous));
                }
            }
            Err(_) => {
                left.fill(0.0);
                right.fill(0.0);
                self.all_notes_off();
                self.emit(EngineEvent::Fault(FaultKind::RenderPanic));
                self.restore_last_good();
            }
        }

        self.frame_counter += frames as u64;
    }
}
