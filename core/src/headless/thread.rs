//! Headless audio thread implementation

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use tracing::debug;

use crate::sync::{AudioBlock, BlockOutcome, BlockProcessor, GateExit};

use super::HeadlessConfig;

/// Counters shared with the handle
#[derive(Debug, Default)]
pub(super) struct HeadlessCounters {
    pub blocks: AtomicU64,
    pub frames: AtomicU64,
}

pub(super) struct HeadlessThread<F> {
    processor: BlockProcessor,
    config: HeadlessConfig,
    source: F,
    counters: Arc<HeadlessCounters>,
    input: Vec<f32>,
    output: Vec<f32>,
}

impl<F> HeadlessThread<F>
where
    F: FnMut(&mut [f32]) + Send + 'static,
{
    pub fn new(
        processor: BlockProcessor,
        config: HeadlessConfig,
        source: F,
        counters: Arc<HeadlessCounters>,
    ) -> Self {
        let input = vec![0.0; config.block_frames * config.in_channels];
        let output = vec![0.0; config.block_frames * config.out_channels];
        Self {
            processor,
            config,
            source,
            counters,
            input,
            output,
        }
    }

    pub fn spawn(self) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("audio-headless".into())
            .spawn(move || {
                let mut audio = self;
                audio.run();
            })
    }

    fn run(&mut self) {
        debug!(
            "Headless audio thread started ({} frames, {}ch -> {}ch)",
            self.config.block_frames, self.config.in_channels, self.config.out_channels
        );

        while self.processor.context().is_running() {
            (self.source)(&mut self.input);

            let outcome = self.processor.process(AudioBlock {
                input: &self.input,
                output: &mut self.output,
                frames: self.config.block_frames,
                in_channels: self.config.in_channels,
                out_channels: self.config.out_channels,
            });

            if let BlockOutcome::Held {
                exit: GateExit::Shutdown,
                ..
            } = outcome
            {
                break;
            }

            self.counters.blocks.fetch_add(1, Ordering::Relaxed);
            self.counters
                .frames
                .fetch_add(self.config.block_frames as u64, Ordering::Relaxed);

            if let Some(pace) = self.config.pace {
                thread::sleep(pace);
            }
        }

        debug!("Headless audio thread finished");
    }
}
