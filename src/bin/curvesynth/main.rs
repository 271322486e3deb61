//! curvesynth - plays a short arpeggio through the engine
//!
//! Run with: RUST_LOG=info cargo run

mod spectrum;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use curvesynth::{
    channel,
    curve::CurveGraph,
    dsp::{lfo::rate_label, oscillator::Waveform},
    synth::{
        params::{Destination, OscillatorParam, SynthState},
        SynthEngine,
    },
    EngineConfig, MAX_BLOCK_SIZE, SAMPLE_BUFFER_LENGTH,
};

use spectrum::PitchReadout;

// A minor, one octave up and back
const ARPEGGIO: [f32; 8] = [220.0, 261.63, 329.63, 440.0, 523.25, 440.0, 329.63, 261.63];
const NOTE_LENGTH: Duration = Duration::from_millis(220);
const REPEATS: usize = 4;

fn patch() -> SynthState {
    let mut state = SynthState::default();
    state.master = 0.2;

    state.oscillator1.waveform = Waveform::Sawtooth;
    state.oscillator1.unison = 0.2;
    state.oscillator1.detune = 0.4;
    state.oscillator1.level = 0.6;

    state.oscillator2.enabled = true;
    state.oscillator2.waveform = Waveform::Triangle;
    state.oscillator2.pan = 0.7;

    state.envelope.attack.x = 0.005;
    state.envelope.release.x = 0.1;

    // slow swell on the second oscillator
    state.lfo.graph = CurveGraph::chain(&[(0.0, 1.0), (0.5, 0.2), (1.0, 1.0)]);
    state.lfo.rate = 3.0 / 7.0;
    state.lfo.toggle_attachment(Destination::Oscillator {
        index: 1,
        param: OscillatorParam::Level,
    });
    state
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::init();

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    let state = patch();
    let (mut controller, mut scheduler, mut engine) =
        channel(EngineConfig::default().with_sample_rate(sample_rate));

    scheduler
        .update(&state.lfo)
        .wrap_err("lfo shape rejected")?;
    if !controller.apply(&state) {
        return Err(eyre!("engine rejected the initial patch"));
    }

    log::info!(
        "{sample_rate} Hz, {channels} channels, lfo rate {}",
        rate_label(state.lfo.rate)
    );

    let running = Arc::new(AtomicBool::new(true));
    let lfo_thread = scheduler.spawn(running.clone());

    let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
    let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            let total_frames = data.len() / channels;
            let mut frames_written = 0;

            while frames_written < total_frames {
                let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                let (l, r) = (&mut left[..frames], &mut right[..frames]);
                engine.render_block(l, r);

                let out_off = frames_written * channels;
                for i in 0..frames {
                    for ch in 0..channels {
                        data[out_off + i * channels + ch] = match ch {
                            0 => l[i],
                            1 => r[i],
                            _ => (l[i] + r[i]) / 2.0,
                        };
                    }
                }

                frames_written += frames;
            }
        },
        |err| log::error!("audio stream error: {err}"),
        None,
    )?;

    stream.play()?;

    let mut readout = PitchReadout::new(SAMPLE_BUFFER_LENGTH, sample_rate);

    for _ in 0..REPEATS {
        for &frequency in &ARPEGGIO {
            controller.note_on(frequency);
            thread::sleep(NOTE_LENGTH);
            controller.note_off(frequency);

            let faults = controller.drain_events();
            let heard = readout
                .dominant_hz(controller.samples())
                .map_or_else(|| "-".to_string(), |hz| format!("{hz:.0} Hz"));
            log::info!(
                "played {frequency:>7.2} Hz  heard {heard}  peak {:.3}  faults {}",
                controller.peak(),
                faults.len()
            );
        }
    }

    // let the last release ring out
    thread::sleep(Duration::from_millis(500));
    controller.all_notes_off();
    thread::sleep(Duration::from_millis(50));

    running.store(false, Ordering::Relaxed);
    lfo_thread
        .join()
        .map_err(|_| eyre!("lfo scheduler thread panicked"))?;

    Ok(())
}
