//! Integration tests for the lockstep core
//!
//! Runs a real audio thread (the headless backend) against a simulation
//! driver and checks tick alignment, drift accounting, and shutdown.

#[cfg(test)]
mod lockstep_tests;

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use crate::config::SyncConfig;
    use crate::headless::{HeadlessAudio, HeadlessConfig};
    use crate::sync::{BlockProcessor, SyncContext};

    /// Generous bound for anything that should happen "promptly"
    pub const TIMEOUT: Duration = Duration::from_secs(5);

    /// Poll `condition` until it holds or `timeout` elapses.
    pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if condition() {
                return true;
            }
            thread::yield_now();
        }
        condition()
    }

    /// Spawn an unpaced headless audio thread producing constant-valued stereo.
    pub fn spawn_headless(
        config: &SyncConfig,
        block_frames: usize,
    ) -> (Arc<SyncContext>, HeadlessAudio) {
        let context = Arc::new(SyncContext::new());
        let processor = BlockProcessor::new(context.clone(), config).unwrap();
        let audio = HeadlessAudio::spawn(
            processor,
            HeadlessConfig {
                block_frames,
                ..HeadlessConfig::default()
            },
            |input: &mut [f32]| input.fill(0.5),
        )
        .unwrap();
        (context, audio)
    }
}
