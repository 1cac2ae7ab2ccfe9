//! Audio-side health monitoring and diagnostics

use std::time::{Duration, Instant};

use tracing::debug;

/// Per-interval counters kept by the audio thread.
#[derive(Debug, Clone)]
pub(super) struct SyncMetrics {
    /// Blocks processed
    pub blocks: u64,
    /// Frames processed
    pub frames: u64,
    /// Blocks that returned without reaching the target
    pub pass_throughs: u64,
    /// Holds that ended with a release
    pub holds: u64,
    /// Catch-up skips
    pub skips: u64,
    /// Holds that ended because of shutdown
    pub shutdown_aborts: u64,
    /// Blocks processed while bypassed
    pub bypassed: u64,
    /// Total time spent held
    pub wait_total: Duration,
    /// Longest single hold
    pub wait_max: Duration,
    /// Timestamp of last metrics log
    pub last_log_time: Instant,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            blocks: 0,
            frames: 0,
            pass_throughs: 0,
            holds: 0,
            skips: 0,
            shutdown_aborts: 0,
            bypassed: 0,
            wait_total: Duration::ZERO,
            wait_max: Duration::ZERO,
            last_log_time: Instant::now(),
        }
    }

    /// Record the time one hold took
    pub fn record_wait(&mut self, waited: Duration) {
        self.wait_total += waited;
        self.wait_max = self.wait_max.max(waited);
    }

    /// Mean wait over every hold, including ones cut short by shutdown
    pub fn avg_wait_us(&self) -> f64 {
        let waits = self.holds + self.shutdown_aborts;
        if waits > 0 {
            self.wait_total.as_secs_f64() * 1_000_000.0 / waits as f64
        } else {
            0.0
        }
    }

    /// Log metrics if enough time has passed (every 1 second)
    pub fn maybe_log(&mut self) {
        if self.last_log_time.elapsed().as_secs() < 1 {
            return;
        }

        let avg_wait_us = self.avg_wait_us();

        debug!(
            "SYNC METRICS [tid={:?}]: blocks={}, frames={}, pass={}, holds={}, skips={}, \
             aborts={}, bypassed={}, avg_wait={:.1}us, max_wait={:?}",
            std::thread::current().id(),
            self.blocks,
            self.frames,
            self.pass_throughs,
            self.holds,
            self.skips,
            self.shutdown_aborts,
            self.bypassed,
            avg_wait_us,
            self.wait_max
        );

        // Reset counters for next interval (show per-second rates)
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avg_wait_counts_shutdown_aborts() {
        let mut metrics = SyncMetrics::new();
        metrics.record_wait(Duration::from_micros(300));
        metrics.holds += 1;
        metrics.record_wait(Duration::from_micros(100));
        metrics.shutdown_aborts += 1;

        assert!((metrics.avg_wait_us() - 200.0).abs() < 1e-6);
        assert_eq!(metrics.wait_max, Duration::from_micros(300));
    }

    #[test]
    fn test_avg_wait_without_holds_is_zero() {
        assert_eq!(SyncMetrics::new().avg_wait_us(), 0.0);
    }
}
