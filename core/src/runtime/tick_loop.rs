//! Fixed timestep tick execution

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::sync::SyncContext;

use super::{RuntimeConfig, Simulation};

/// Run one simulation tick and release the audio gate for it.
///
/// The release comes strictly after the tick, so a held audio thread only
/// resumes once the tick's state has been consumed.
pub(super) fn run_tick<S: Simulation>(
    config: &RuntimeConfig,
    simulation: &mut S,
    context: &SyncContext,
    tick: &mut u64,
) -> Result<()> {
    let tick_start = Instant::now();

    simulation.tick(*tick)?;
    *tick += 1;
    context.release_tick();

    // Check CPU budget
    let tick_time = tick_start.elapsed();
    if tick_time > config.cpu_budget {
        tracing::warn!(
            "Tick took {:?}, exceeds budget of {:?}",
            tick_time,
            config.cpu_budget
        );
    }

    Ok(())
}

/// Execute a single frame with fixed timestep.
///
/// Accumulates wall-clock time (clamped to `max_delta`) and runs as many
/// ticks as fit. Returns the number of ticks executed.
pub(super) fn execute_frame<S: Simulation>(
    config: &RuntimeConfig,
    tick_duration: Duration,
    accumulator: &mut Duration,
    last_update: &mut Option<Instant>,
    simulation: &mut S,
    context: &SyncContext,
    tick: &mut u64,
) -> Result<u32> {
    let now = Instant::now();

    // Calculate delta time
    let delta = if let Some(last) = *last_update {
        (now - last).min(config.max_delta)
    } else {
        tick_duration
    };
    *last_update = Some(now);
    *accumulator += delta;

    let mut ticks = 0u32;
    while *accumulator >= tick_duration {
        if !context.is_running() {
            *accumulator = Duration::ZERO;
            break;
        }

        run_tick(config, simulation, context, tick)?;

        *accumulator -= tick_duration;
        ticks += 1;
    }

    Ok(ticks)
}
