//! Headless audio backend
//!
//! Stands in for a real audio engine: a dedicated thread invokes the
//! [`BlockProcessor`] with fixed-size blocks, the way a backend's mixer thread
//! would. Used for CI, tests, and device-less runs.
//!
//! ```text
//! Simulation Thread              audio-headless Thread
//!     │                                │
//!     │                          [source fills input]
//!     │                          [process(block)] ── may hold
//! [tick]──────(release)─────────►      │
//!     │                          [optional pacing sleep]
//! ```

mod handle;
mod thread;

pub use handle::HeadlessAudio;

use std::time::Duration;

/// Headless backend configuration
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Frames per block (the backend's choice, not the simulation's)
    pub block_frames: usize,
    /// Channels produced by the source
    pub in_channels: usize,
    /// Channels of the simulated device
    pub out_channels: usize,
    /// Sleep between blocks; `None` runs as fast as the gate allows
    pub pace: Option<Duration>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            block_frames: 1024,
            in_channels: 2,
            out_channels: 2,
            pace: None,
        }
    }
}

impl HeadlessConfig {
    /// Pace blocks at real time for the given sample rate.
    pub fn real_time(mut self, sample_rate: u32) -> Self {
        self.pace = Some(Duration::from_secs_f64(
            self.block_frames as f64 / f64::from(sample_rate.max(1)),
        ));
        self
    }
}
