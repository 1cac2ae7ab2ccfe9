//! Lockstep Core - frame-synchronized audio blocking
//!
//! Holds a backend's audio thread at every simulation tick boundary so that
//! audio output advances in lockstep with a fixed-rate simulation clock, as
//! needed for frame-accurate recording and playback.
//!
//! # Architecture
//!
//! - [`BlockProcessor`] - Per-block hook for the backend's audio thread (remap, account, gate)
//! - [`SyncContext`] - Flags and counters shared by the audio and simulation threads
//! - [`TickDriver`] - Fixed timestep simulation driver; releases the gate once per tick
//! - [`HeadlessAudio`] - Backend stand-in thread for CI and device-less runs

pub mod config;
pub mod headless;
#[cfg(test)]
mod integration;
pub mod runtime;
pub mod sync;

pub use config::{AudioConfig, Config, ConfigError, SyncConfig};
pub use headless::{HeadlessAudio, HeadlessConfig};
pub use runtime::{RuntimeConfig, Simulation, TickDriver};
pub use sync::{
    AudioBlock, BlockDecision, BlockOutcome, BlockProcessor, GateExit, SampleAccumulator,
    SkipCarry, SyncContext, SyncStatus, WaitStrategy, remap_channels,
};
