//! Tick driver configuration

use std::time::Duration;

/// Tick driver configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Simulation tick rate in Hz; must match the rate the processor was built with
    pub tick_rate: u32,
    /// Longest wall-clock gap credited to one frame (bounds catch-up bursts)
    pub max_delta: Duration,
    /// Tick duration above which a warning is logged
    pub cpu_budget: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::with_tick_rate(60)
    }
}

impl RuntimeConfig {
    /// Default budgets at the given tick rate.
    pub fn with_tick_rate(tick_rate: u32) -> Self {
        Self {
            tick_rate,
            max_delta: Duration::from_millis(100),
            cpu_budget: Duration::from_millis(4),
        }
    }
}
