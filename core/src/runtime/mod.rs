//! Simulation driver
//!
//! Advances a simulation at a fixed tick rate and, after each tick, releases
//! the audio thread held at the matching tick boundary. This is the only
//! place that clears the gate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::sync::SyncContext;

mod config;
mod tick_loop;

#[cfg(test)]
mod tests;

pub use config::RuntimeConfig;

/// A fixed-step simulation driven by [`TickDriver`].
pub trait Simulation {
    /// Advance one tick. `tick` counts from zero.
    fn tick(&mut self, tick: u64) -> Result<()>;
}

impl<F> Simulation for F
where
    F: FnMut(u64) -> Result<()>,
{
    fn tick(&mut self, tick: u64) -> Result<()> {
        self(tick)
    }
}

/// Fixed timestep driver for a [`Simulation`]
pub struct TickDriver<S: Simulation> {
    simulation: S,
    context: Arc<SyncContext>,
    config: RuntimeConfig,
    accumulator: Duration,
    last_update: Option<Instant>,
    tick_duration: Duration,
    tick: u64,
}

impl<S: Simulation> TickDriver<S> {
    /// Create a driver releasing `context` once per tick.
    pub fn new(simulation: S, context: Arc<SyncContext>, config: RuntimeConfig) -> Self {
        let tick_duration = tick_duration_for(config.tick_rate);
        Self {
            simulation,
            context,
            config,
            accumulator: Duration::ZERO,
            last_update: None,
            tick_duration,
            tick: 0,
        }
    }

    /// Set the tick rate
    pub fn set_tick_rate(&mut self, tick_rate: u32) {
        self.config.tick_rate = tick_rate;
        self.tick_duration = tick_duration_for(tick_rate);
    }

    /// Get the tick duration (time per tick, inverse of tick rate)
    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Run a single frame (may include several ticks, or none).
    ///
    /// Returns the number of ticks that were executed. Runs nothing once the
    /// context has shut down.
    pub fn frame(&mut self) -> Result<u32> {
        tick_loop::execute_frame(
            &self.config,
            self.tick_duration,
            &mut self.accumulator,
            &mut self.last_update,
            &mut self.simulation,
            &self.context,
            &mut self.tick,
        )
    }

    /// Run exactly one tick regardless of wall-clock time (frame advance).
    pub fn step(&mut self) -> Result<()> {
        tick_loop::run_tick(
            &self.config,
            &mut self.simulation,
            &self.context,
            &mut self.tick,
        )
    }

    /// Ticks executed so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Get the current tick rate
    pub fn tick_rate(&self) -> u32 {
        self.config.tick_rate
    }

    /// Shared context this driver releases
    pub fn context(&self) -> &Arc<SyncContext> {
        &self.context
    }

    /// Get a reference to the simulation
    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    /// Get a mutable reference to the simulation
    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.simulation
    }

    /// End the run; a held audio thread is let go without a tick.
    pub fn shutdown(&self) {
        self.context.shutdown();
    }
}

fn tick_duration_for(tick_rate: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1)))
}
