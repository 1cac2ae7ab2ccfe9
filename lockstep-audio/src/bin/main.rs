//! Lockstep - audio output gated by a fixed-rate simulation clock
//!
//! Plays a test tone whose output is held at every tick boundary until the
//! simulation has finished that tick.
//!
//! # Usage
//!
//! ```bash
//! lockstep
//! lockstep --ticks 600 --wait condvar
//! lockstep --headless --block-frames 1024
//! lockstep --config lockstep.toml --bypass
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use lockstep_audio::{PlayerConfig, run};
use lockstep_core::{SkipCarry, WaitStrategy, config};

#[derive(Clone, Copy, ValueEnum)]
enum WaitArg {
    /// Busy-wait on the audio thread (halts the backend's mixer too)
    Spin,
    /// Sleep on a condition variable (frees the CPU)
    Condvar,
}

impl From<WaitArg> for WaitStrategy {
    fn from(arg: WaitArg) -> Self {
        match arg {
            WaitArg::Spin => WaitStrategy::Spin,
            WaitArg::Condvar => WaitStrategy::Condvar,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SkipCarryArg {
    /// Discard the skipping block's samples
    Drop,
    /// Count them toward the next tick
    Carry,
}

impl From<SkipCarryArg> for SkipCarry {
    fn from(arg: SkipCarryArg) -> Self {
        match arg {
            SkipCarryArg::Drop => SkipCarry::Drop,
            SkipCarryArg::Carry => SkipCarry::Carry,
        }
    }
}

#[derive(Parser)]
#[command(name = "lockstep")]
#[command(
    author,
    version,
    about = "Lockstep - audio output gated by a fixed-rate simulation clock"
)]
struct Args {
    /// Config file (TOML); the platform config directory is used when omitted
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of simulation ticks to run
    #[arg(long, short = 't', default_value = "300")]
    ticks: u64,

    /// Preferred sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Simulation tick rate in Hz
    #[arg(long)]
    tick_rate: Option<u32>,

    /// How the audio thread waits at a tick boundary
    #[arg(long, value_enum)]
    wait: Option<WaitArg>,

    /// What a catch-up skip does with its block's samples
    #[arg(long, value_enum)]
    skip_carry: Option<SkipCarryArg>,

    /// Start with lockstep disabled (remap only)
    #[arg(long)]
    bypass: bool,

    // === Backend ===
    /// Run without an audio device
    #[arg(long)]
    headless: bool,

    /// Block size of the headless backend in frames
    #[arg(long, default_value = "1024")]
    block_frames: usize,

    /// Fixed device buffer size in frames
    #[arg(long)]
    buffer_frames: Option<u32>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => config::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => config::load(),
    };

    // Command line overrides the file
    if let Some(rate) = args.sample_rate {
        settings.sync.sample_rate = rate;
    }
    if let Some(rate) = args.tick_rate {
        settings.sync.tick_rate = rate;
    }
    if let Some(wait) = args.wait {
        settings.sync.wait = wait.into();
    }
    if let Some(carry) = args.skip_carry {
        settings.sync.skip_carry = carry.into();
    }
    if args.bypass {
        settings.sync.start_bypassed = true;
    }
    if args.buffer_frames.is_some() {
        settings.audio.buffer_frames = args.buffer_frames;
    }

    if args.block_frames == 0 {
        anyhow::bail!("Block size must be at least one frame");
    }

    let report = run(PlayerConfig {
        config: settings,
        ticks: args.ticks,
        headless: args.headless,
        block_frames: args.block_frames,
    })?;

    println!(
        "{} ticks at {} Hz ({} samples/tick): {} holds, {} skips, {} samples of drift banked",
        report.ticks,
        report.sample_rate,
        report.target_samples_per_tick,
        report.status.holds,
        report.status.skips,
        report.status.accumulated_error
    );

    Ok(())
}
