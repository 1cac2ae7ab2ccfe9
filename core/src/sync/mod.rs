//! Frame-synchronized audio blocking
//!
//! Keeps audio production in lockstep with a fixed-rate simulation clock so
//! that recorded audio lines up exactly with recorded ticks.
//!
//! # Architecture
//!
//! ```text
//! Backend audio thread                          Simulation thread
//!     │                                                │
//! [process(block)]                                     │
//!     │ remap channels                                 │
//!     │ record samples ──► PassThrough / Skip / Hold   │
//!     │                                   │            │
//!     │                             [blocked = true]   │
//!     │                             [wait] ◄─────────[tick done: blocked = false]
//!     │ settle overshoot                               │
//! [return to backend]                                  │
//! ```
//!
//! The accumulator lives inside the audio-side [`BlockProcessor`], so only the
//! audio thread can mutate the sample counters. The [`SyncContext`] is the
//! only state both threads share.

mod accumulator;
mod gate;
mod metrics;
mod processor;
mod remap;

pub use accumulator::{BlockDecision, SampleAccumulator, SkipCarry};
pub use gate::{GateExit, SyncContext, SyncStatus, WaitStrategy};
pub use processor::{AudioBlock, BlockOutcome, BlockProcessor};
pub use remap::remap_channels;
