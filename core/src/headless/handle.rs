//! Headless audio thread handle
//!
//! Owns the thread's lifecycle and exposes its progress counters.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use crate::sync::{BlockProcessor, SyncContext};

use super::HeadlessConfig;
use super::thread::{HeadlessCounters, HeadlessThread};

/// Handle to a running headless audio thread
///
/// Dropping the handle shuts the shared context down and joins the thread.
pub struct HeadlessAudio {
    context: Arc<SyncContext>,
    counters: Arc<HeadlessCounters>,
    handle: Option<JoinHandle<()>>,
}

impl HeadlessAudio {
    /// Spawn the thread. `source` fills one interleaved input block per call.
    pub fn spawn<F>(
        processor: BlockProcessor,
        config: HeadlessConfig,
        source: F,
    ) -> std::io::Result<Self>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let context = processor.context().clone();
        let counters = Arc::new(HeadlessCounters::default());
        let handle = HeadlessThread::new(processor, config, source, counters.clone()).spawn()?;

        Ok(Self {
            context,
            counters,
            handle: Some(handle),
        })
    }

    /// Blocks fully processed (a block interrupted by shutdown is not counted)
    pub fn blocks_processed(&self) -> u64 {
        self.counters.blocks.load(Ordering::Relaxed)
    }

    /// Frames fully processed
    pub fn frames_processed(&self) -> u64 {
        self.counters.frames.load(Ordering::Relaxed)
    }

    /// Check if the audio thread is still running
    pub fn is_alive(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Shut down and wait for the thread to exit.
    pub fn stop(mut self) {
        self.join();
    }

    fn join(&mut self) {
        // The thread may be held at the gate; shutdown is what lets it go.
        self.context.shutdown();

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for HeadlessAudio {
    fn drop(&mut self) {
        self.join();
    }
}
