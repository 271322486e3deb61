// Purpose: voice lifecycle, parameter snapshots, and the threads that feed them.
// The control thread talks to the render thread only through rtrb rings.

pub mod config;
pub mod controller;
pub mod message;
pub mod modulation;
pub mod params;
pub mod poly;
pub mod voice;

use std::sync::Arc;

use rtrb::RingBuffer;

pub use config::EngineConfig;
pub use controller::SynthController;
pub use message::{EngineEvent, SynthMessage};
pub use modulation::{LfoScheduler, ModulationFrame};
pub use params::{ParameterSnapshot, SynthState};
pub use poly::VoiceManager;

const LFO_UPDATE_CAPACITY: usize = 16;

/// The operations a host needs from a synth engine.
pub trait SynthEngine {
    /// Swap in a new parameter snapshot. Takes effect for the next block.
    fn configure(&mut self, snapshot: Arc<ParameterSnapshot>);
    fn note_on(&mut self, frequency: f32);
    fn note_off(&mut self, frequency: f32);
    /// Fill both buffers with the next block. Frames past the shorter of the
    /// two are left untouched.
    fn render_block(&mut self, left: &mut [f32], right: &mut [f32]);
}

/// Wire up an engine.
///
/// The controller stays on the control thread, the scheduler gets its own
/// timer thread ([`LfoScheduler::spawn`]), and the voice manager moves into
/// the audio callback.
pub fn channel(config: EngineConfig) -> (SynthController, LfoScheduler, VoiceManager) {
    let (tx, rx) = RingBuffer::new(config.channel_capacity);
    let (lfo_tx, lfo_rx) = RingBuffer::new(LFO_UPDATE_CAPACITY);
    // a second of ticks; the engine only keeps the newest
    let (frame_tx, frame_rx) = RingBuffer::new(1000);
    let (event_tx, event_rx) = RingBuffer::new(message::EVENT_CAPACITY);

    let controller = SynthController::new(tx, lfo_tx, event_rx);
    let scheduler = LfoScheduler::new(frame_tx, lfo_rx);
    let engine = VoiceManager::new(&config, rx, frame_rx, event_tx);

    log::debug!(
        "engine channel ready: {} Hz, {} voices, {} frame blocks",
        config.sample_rate,
        config.max_voices,
        config.block_size
    );

    (controller, scheduler, engine)
}
