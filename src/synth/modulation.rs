use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use rtrb::{Consumer, Producer};

use crate::{
    dsp::lfo::{lfo_rate_ms, LfoTable},
    error::CurveError,
    synth::params::{DestinationSet, Lfo},
};

/// Control-rate tick period.
pub const TICK: Duration = Duration::from_millis(1);

/// One tick of LFO output: the value every attached destination takes for now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationFrame {
    pub value: f32,
    pub targets: DestinationSet,
}

/// Runs the LFO at control rate, independent of the audio block cadence.
///
/// Each tick reads one entry of the precomputed table and pushes a
/// [`ModulationFrame`] to the engine. The engine applies it to its runtime
/// values only; the configured knob values never change.
pub struct LfoScheduler {
    table: Option<LfoTable>,
    targets: DestinationSet,
    tick: usize,
    tx: Producer<ModulationFrame>,
    updates: Consumer<Lfo>,
}

impl LfoScheduler {
    pub(crate) fn new(tx: Producer<ModulationFrame>, updates: Consumer<Lfo>) -> Self {
        Self {
            table: None,
            targets: DestinationSet::empty(),
            tick: 0,
            tx,
            updates,
        }
    }

    /// Rebuild the table for a new shape or rate.
    ///
    /// A malformed graph keeps the previous table and its destinations
    /// running, and reports the error.
    pub fn update(&mut self, lfo: &Lfo) -> Result<(), CurveError> {
        let period = lfo_rate_ms(lfo.rate);

        match LfoTable::build(&lfo.graph, period) {
            Ok(table) => {
                self.targets = lfo.attachments;
                log::debug!("lfo table rebuilt: {period} ms, {} targets", self.targets.len());
                self.table = Some(table);
                Ok(())
            }
            Err(err) => {
                log::warn!("lfo shape rejected, holding previous table: {err}");
                Err(err)
            }
        }
    }

    /// Advance one millisecond. Returns the frame that was sent, if any.
    pub fn tick(&mut self) -> Option<ModulationFrame> {
        while let Ok(lfo) = self.updates.pop() {
            // already logged; the old table stays in place
            let _ = self.update(&lfo);
        }

        let table = self.table.as_ref()?;
        let frame = ModulationFrame {
            value: table.value_at(self.tick),
            targets: self.targets,
        };
        self.tick = (self.tick + 1) % table.period_ms();

        // a full ring just drops this tick
        self.tx.push(frame).ok()?;
        Some(frame)
    }

    /// Run on a dedicated thread until `running` goes false.
    pub fn spawn(mut self, running: Arc<AtomicBool>) -> JoinHandle<()> {
        thread::spawn(move || {
            log::info!("lfo scheduler started");
            let mut next = Instant::now();
            while running.load(Ordering::Relaxed) {
                self.tick();
                next += TICK;
                let now = Instant::now();
                if next > now {
                    thread::sleep(next - now);
                } else {
                    // fell behind; don't try to catch up in a burst
                    next = now;
                }
            }
            log::info!("lfo scheduler stopped");
        })
    }

    pub fn table(&self) -> Option<&LfoTable> {
        self.table.as_ref()
    }
}
