//! Lockstep player
//!
//! Wires a tone-producing simulation, the tick driver, and an audio side
//! (a cpal device or the headless backend) around one shared context.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};
use tracing::{debug, info};

use lockstep_core::{
    BlockProcessor, Config, HeadlessAudio, HeadlessConfig, RuntimeConfig, Simulation,
    SyncContext, SyncStatus, TickDriver,
};

use crate::output::{OutputDevice, SyncedOutput};
use crate::tone::ToneSource;

/// Player configuration
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Sync and audio settings
    pub config: Config,
    /// Ticks to run before shutting down
    pub ticks: u64,
    /// Use the headless backend instead of an output device
    pub headless: bool,
    /// Block size of the headless backend
    pub block_frames: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            config: Config::default(),
            ticks: 300,
            headless: false,
            block_frames: 1024,
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Ticks the driver executed
    pub ticks: u64,
    /// Sample rate the run was clocked at
    pub sample_rate: u32,
    /// Samples per tick at that rate
    pub target_samples_per_tick: u64,
    /// Shared state at shutdown
    pub status: SyncStatus,
}

/// The audio side kept alive for the run
enum AudioSide {
    Device(SyncedOutput),
    Headless(HeadlessAudio),
}

/// Simulation that produces exactly one tick of audio per tick
struct ToneSimulation {
    tone: ToneSource,
    producer: HeapProd<f32>,
    frames_per_tick: usize,
    buffer: Vec<f32>,
    context: Arc<SyncContext>,
    tick_rate: u64,
}

impl Simulation for ToneSimulation {
    fn tick(&mut self, tick: u64) -> Result<()> {
        self.buffer.clear();
        self.tone.fill(self.frames_per_tick, &mut self.buffer);

        let pushed = self.producer.push_slice(&self.buffer);
        if pushed < self.buffer.len() {
            // Audio side is behind (or bypassed and slower); drop the rest
            debug!(
                "Audio buffer overflow: dropped {} samples",
                self.buffer.len() - pushed
            );
        }

        if tick % self.tick_rate == 0 {
            let status = self.context.status();
            info!(
                "tick {}: recorded={} error={} holds={} skips={}{}",
                tick,
                status.recorded_samples,
                status.accumulated_error,
                status.holds,
                status.skips,
                if status.bypassed { " (bypassed)" } else { "" }
            );
        }

        Ok(())
    }
}

/// Run the player until `config.ticks` ticks have executed.
pub fn run(config: PlayerConfig) -> Result<RunReport> {
    let PlayerConfig {
        config,
        ticks,
        headless,
        block_frames,
    } = config;
    config.sync.validate().context("invalid sync configuration")?;

    let context = Arc::new(SyncContext::new());

    let device = if headless {
        None
    } else {
        Some(OutputDevice::open(&config.sync).context("failed to open audio output")?)
    };
    let sample_rate = device
        .as_ref()
        .map_or(config.sync.sample_rate, OutputDevice::sample_rate);
    let sync = config.sync.with_sample_rate(sample_rate);
    let target = sync.target_samples_per_tick()?;

    let source_channels = config.audio.source_channels.max(1);
    let frames_per_tick = usize::try_from(target)?;
    let ring_ticks = usize::try_from(config.audio.ring_ticks.max(1))?;
    let capacity = frames_per_tick * usize::from(source_channels) * ring_ticks;
    let (producer, mut consumer) = HeapRb::<f32>::new(capacity).split();

    let audio = match device {
        Some(device) => AudioSide::Device(device.start(
            context.clone(),
            &sync,
            &config.audio,
            consumer,
        )?),
        None => {
            let processor = BlockProcessor::new(context.clone(), &sync)?;
            let headless_config = HeadlessConfig {
                block_frames: block_frames.max(1),
                in_channels: usize::from(source_channels),
                out_channels: 2,
                pace: None,
            }
            .real_time(sample_rate);
            AudioSide::Headless(
                HeadlessAudio::spawn(processor, headless_config, move |input: &mut [f32]| {
                    let popped = consumer.pop_slice(input);
                    input[popped..].fill(0.0);
                })
                .context("failed to spawn headless audio thread")?,
            )
        }
    };

    let simulation = ToneSimulation {
        tone: ToneSource::new(
            config.audio.tone_hz,
            sample_rate,
            source_channels,
            config.audio.volume,
        ),
        producer,
        frames_per_tick,
        buffer: Vec::with_capacity(frames_per_tick * usize::from(source_channels)),
        context: context.clone(),
        tick_rate: u64::from(sync.tick_rate),
    };
    let mut driver = TickDriver::new(
        simulation,
        context.clone(),
        RuntimeConfig::with_tick_rate(sync.tick_rate),
    );

    info!(
        "Running {} ticks at {} Hz ({} samples/tick, {:?} wait, {})",
        ticks,
        sync.tick_rate,
        target,
        sync.wait,
        match &audio {
            AudioSide::Device(output) => format!("device {}ch", output.channels()),
            AudioSide::Headless(_) => format!("headless {block_frames}-frame blocks"),
        }
    );

    while driver.tick_count() < ticks {
        driver.frame()?;
        thread::sleep(Duration::from_millis(1));
    }

    driver.shutdown();
    let status = context.status();

    if let AudioSide::Headless(backend) = audio {
        debug!(
            "Headless backend processed {} blocks ({} frames)",
            backend.blocks_processed(),
            backend.frames_processed()
        );
        backend.stop();
    }

    info!(
        "Run finished: {} ticks, {} holds, {} skips, error {} samples",
        driver.tick_count(),
        status.holds,
        status.skips,
        status.accumulated_error
    );

    Ok(RunReport {
        ticks: driver.tick_count(),
        sample_rate,
        target_samples_per_tick: target,
        status,
    })
}
