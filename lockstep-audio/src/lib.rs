//! Lockstep audio player
//!
//! Hosts the [`lockstep_core::BlockProcessor`] inside a cpal output stream and
//! drives it with a fixed-rate simulation that produces one tick of audio per
//! tick.
//!
//! ```text
//! Main Thread (simulation)             cpal Thread
//!     │                                     │
//! [tick: generate 1 tick of audio]          │
//! [push]──────────(ring)──────────────►[pop block]
//! [release gate]────────────────────►  [remap → account → hold?]
//! ```

pub mod output;
pub mod player;
pub mod tone;

pub use output::{OutputDevice, OutputError, SyncedOutput};
pub use player::{PlayerConfig, RunReport, run};
pub use tone::ToneSource;
