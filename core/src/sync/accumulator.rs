//! Sample drift accounting between audio blocks and simulation ticks

use serde::{Deserialize, Serialize};

/// What a catch-up skip does with the samples of the block that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipCarry {
    /// Discard them; the next tick starts counting from zero.
    #[default]
    Drop,
    /// Count them toward the next tick.
    Carry,
}

/// Decision for one block, made after its samples were recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDecision {
    /// Below the target; return to the backend immediately.
    PassThrough,
    /// Tick boundary crossed by spending accumulated surplus instead of waiting.
    Skip,
    /// Tick boundary reached; hold until the simulation releases, then
    /// [`SampleAccumulator::settle`].
    Hold,
}

/// Counts samples produced since the last tick boundary and the surplus
/// carried across boundaries.
///
/// Blocks rarely divide the per-tick target evenly, so every hold overshoots
/// a little. The overshoot accumulates in `accumulated_error`; once a whole
/// tick's worth has built up, the next boundary is a skip.
#[derive(Debug, Clone)]
pub struct SampleAccumulator {
    target: u64,
    skip_carry: SkipCarry,
    recorded_samples: u64,
    accumulated_error: u64,
}

impl SampleAccumulator {
    /// Create an accumulator for `target` samples per tick.
    pub fn new(target: u64, skip_carry: SkipCarry) -> Self {
        Self {
            target,
            skip_carry,
            recorded_samples: 0,
            accumulated_error: 0,
        }
    }

    /// Record a block of `frames` samples and decide what to do with it.
    pub fn record(&mut self, frames: u64) -> BlockDecision {
        self.recorded_samples += frames;

        if self.accumulated_error >= self.target {
            self.accumulated_error -= self.target;
            self.recorded_samples = match self.skip_carry {
                SkipCarry::Drop => 0,
                SkipCarry::Carry => frames,
            };
            return BlockDecision::Skip;
        }

        if self.recorded_samples >= self.target {
            BlockDecision::Hold
        } else {
            BlockDecision::PassThrough
        }
    }

    /// Close the tick after a hold: bank the overshoot and restart counting.
    ///
    /// Returns the overshoot that was added to the accumulated error.
    pub fn settle(&mut self) -> u64 {
        let overshoot = self.recorded_samples.saturating_sub(self.target);
        self.accumulated_error += overshoot;
        self.recorded_samples = 0;
        overshoot
    }

    /// Samples recorded since the last tick boundary
    pub fn recorded_samples(&self) -> u64 {
        self.recorded_samples
    }

    /// Surplus samples carried across tick boundaries
    pub fn accumulated_error(&self) -> u64 {
        self.accumulated_error
    }

    /// Ideal samples per tick
    pub fn target(&self) -> u64 {
        self.target
    }
}
