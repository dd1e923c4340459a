//! Per-block output counters.
//!
//! Collected on the audio thread without allocation; summaries are taken
//! periodically and shipped to the control thread for logging.

/// Ring buffer size for per-block samples.
const BLOCK_BUFFER_SIZE: usize = 256;

pub struct BlockTelemetry {
    /// Ring buffer of events emitted per block
    emitted: [u32; BLOCK_BUFFER_SIZE],
    idx: usize,
    /// Largest block observed in the current window
    max_emitted: u32,
    /// Events dropped for capacity, cumulative
    dropped_total: u64,
    /// Blocks recorded, cumulative
    blocks: u64,
    /// Number of samples collected (saturates at BLOCK_BUFFER_SIZE)
    sample_count: usize,
}

impl Default for BlockTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTelemetry {
    pub fn new() -> Self {
        Self {
            emitted: [0; BLOCK_BUFFER_SIZE],
            idx: 0,
            max_emitted: 0,
            dropped_total: 0,
            blocks: 0,
            sample_count: 0,
        }
    }

    /// Record the outcome of one block.
    #[inline]
    pub fn record(&mut self, emitted: u32, dropped: u32) {
        self.emitted[self.idx] = emitted;
        self.idx = (self.idx + 1) % BLOCK_BUFFER_SIZE;

        if self.sample_count < BLOCK_BUFFER_SIZE {
            self.sample_count += 1;
        }
        self.max_emitted = self.max_emitted.max(emitted);
        self.dropped_total += dropped as u64;
        self.blocks += 1;
    }

    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Returns (avg_emitted, max_emitted, dropped_total, blocks) and resets
    /// the max for the next window. Totals stay cumulative.
    pub fn take_summary(&mut self) -> (u32, u32, u64, u64) {
        if self.sample_count == 0 {
            return (0, 0, self.dropped_total, self.blocks);
        }

        let sum: u64 = self.emitted[..self.sample_count]
            .iter()
            .map(|&x| x as u64)
            .sum();
        let avg = (sum / self.sample_count as u64) as u32;
        let max = self.max_emitted;
        self.max_emitted = 0;

        (avg, max, self.dropped_total, self.blocks)
    }

    /// Zero everything (instance activation).
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
