//! Per-block hook run on the backend's audio thread

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{ConfigError, SyncConfig};

use super::accumulator::{BlockDecision, SampleAccumulator};
use super::gate::{GateExit, SyncContext, WaitStrategy};
use super::metrics::SyncMetrics;
use super::remap::remap_channels;

/// One invocation's worth of audio, as handed over by the backend.
///
/// `input` holds `frames * in_channels` interleaved samples, `output` has
/// room for `frames * out_channels`.
#[derive(Debug)]
pub struct AudioBlock<'a> {
    pub input: &'a [f32],
    pub output: &'a mut [f32],
    pub frames: usize,
    pub in_channels: usize,
    pub out_channels: usize,
}

/// What happened to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Processor inactive; remapped only.
    Bypassed,
    /// Below the per-tick target.
    PassThrough,
    /// Catch-up skip taken.
    Skip,
    /// Held at a tick boundary.
    Held { waited: Duration, exit: GateExit },
}

/// Audio-thread side of the lockstep.
///
/// Owns the sample counters, so nothing but the audio thread can change them.
/// Build one per output stream and move it into the backend's callback.
pub struct BlockProcessor {
    context: Arc<SyncContext>,
    accumulator: SampleAccumulator,
    wait: WaitStrategy,
    metrics: SyncMetrics,
}

impl BlockProcessor {
    /// Build a processor for `config`, computing the per-tick target once.
    pub fn new(context: Arc<SyncContext>, config: &SyncConfig) -> Result<Self, ConfigError> {
        let target = config.target_samples_per_tick()?;
        if config.start_bypassed {
            context.set_bypassed(true);
        }
        Ok(Self {
            context,
            accumulator: SampleAccumulator::new(target, config.skip_carry),
            wait: config.wait,
            metrics: SyncMetrics::new(),
        })
    }

    /// Process one block: remap, account, then pass, skip, or hold.
    pub fn process(&mut self, block: AudioBlock<'_>) -> BlockOutcome {
        remap_channels(
            block.input,
            block.in_channels,
            block.output,
            block.out_channels,
            block.frames,
        );

        self.metrics.blocks += 1;
        self.metrics.frames += block.frames as u64;

        let outcome = if self.context.is_bypassed() {
            self.metrics.bypassed += 1;
            BlockOutcome::Bypassed
        } else {
            self.account(block.frames as u64)
        };

        self.metrics.maybe_log();
        outcome
    }

    fn account(&mut self, frames: u64) -> BlockOutcome {
        let decision = self.accumulator.record(frames);
        self.publish();

        match decision {
            BlockDecision::PassThrough => {
                self.metrics.pass_throughs += 1;
                BlockOutcome::PassThrough
            }
            BlockDecision::Skip => {
                self.context.count_skip();
                self.metrics.skips += 1;
                BlockOutcome::Skip
            }
            BlockDecision::Hold => {
                let start = Instant::now();
                let exit = self.context.hold(self.wait);
                let waited = start.elapsed();

                self.accumulator.settle();
                self.publish();

                self.metrics.record_wait(waited);
                match exit {
                    GateExit::Released => self.metrics.holds += 1,
                    GateExit::Shutdown => self.metrics.shutdown_aborts += 1,
                }
                BlockOutcome::Held { waited, exit }
            }
        }
    }

    fn publish(&self) {
        self.context.publish(
            self.accumulator.recorded_samples(),
            self.accumulator.accumulated_error(),
        );
    }

    /// Shared context this processor gates against
    pub fn context(&self) -> &Arc<SyncContext> {
        &self.context
    }

    /// Read-only view of the sample counters
    pub fn accumulator(&self) -> &SampleAccumulator {
        &self.accumulator
    }
}
