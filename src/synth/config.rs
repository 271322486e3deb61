/// Engine-wide settings fixed when the channel is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub max_voices: usize,
    pub block_size: usize,       // frames per render call the host is expected to ask for
    pub channel_capacity: usize, // slots in the control → engine message ring
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 32,
            block_size: 128,
            channel_capacity: 1024,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices.max(1);
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.clamp(1, crate::MAX_BLOCK_SIZE);
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Length of one frame in milliseconds.
    pub fn ms_per_frame(&self) -> f64 {
        1000.0 / self.sample_rate as f64
    }
}
