//! Dominant-frequency readout for the engine's visualization buffer.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

pub struct PitchReadout {
    window: Vec<f32>, // Hann, reduces leakage between neighbouring bins
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    hz_per_bin: f32,
}

impl PitchReadout {
    pub fn new(buffer_len: usize, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(buffer_len);

        let window = (0..buffer_len)
            .map(|i| {
                if buffer_len > 1 {
                    let denom = (buffer_len - 1) as f32;
                    0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos())
                } else {
                    1.0
                }
            })
            .collect();

        Self {
            window,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); buffer_len],
            hz_per_bin: sample_rate / buffer_len.max(1) as f32,
        }
    }

    /// Centre frequency of the loudest bin, or `None` for silence.
    pub fn dominant_hz(&mut self, samples: &[f32]) -> Option<f32> {
        for ((slot, &s), &w) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let half = self.scratch.len() / 2;
        let (bin, magnitude) = self.scratch[1..half]
            .iter()
            .map(|c| c.norm())
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))?;

        (magnitude > 1e-3).then(|| (bin + 1) as f32 * self.hz_per_bin)
    }
}
