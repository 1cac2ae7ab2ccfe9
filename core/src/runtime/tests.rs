//! Runtime tests

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::sync::SyncContext;

use super::{RuntimeConfig, Simulation, TickDriver};

#[derive(Default)]
struct CountingSim {
    seen: Vec<u64>,
}

impl Simulation for CountingSim {
    fn tick(&mut self, tick: u64) -> Result<()> {
        self.seen.push(tick);
        Ok(())
    }
}

fn driver() -> TickDriver<CountingSim> {
    TickDriver::new(
        CountingSim::default(),
        Arc::new(SyncContext::new()),
        RuntimeConfig::default(),
    )
}

// ============================================================================
// RuntimeConfig Tests
// ============================================================================

#[test]
fn test_runtime_config_default() {
    let config = RuntimeConfig::default();
    assert_eq!(config.tick_rate, 60);
    assert_eq!(config.max_delta, Duration::from_millis(100));
    assert_eq!(config.cpu_budget, Duration::from_micros(4000));
}

#[test]
fn test_runtime_config_with_tick_rate() {
    let config = RuntimeConfig::with_tick_rate(50);
    assert_eq!(config.tick_rate, 50);
    assert_eq!(config.max_delta, Duration::from_millis(100));
}

// ============================================================================
// Driver Tests
// ============================================================================

#[test]
fn test_driver_new() {
    let driver = driver();
    assert_eq!(driver.tick_rate(), 60);
    assert_eq!(driver.tick_count(), 0);
    assert!(driver.simulation().seen.is_empty());
}

#[test]
fn test_driver_set_tick_rate() {
    let mut driver = driver();

    driver.set_tick_rate(30);
    assert_eq!(driver.tick_rate(), 30);
    assert!((driver.tick_duration().as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);

    driver.set_tick_rate(120);
    assert_eq!(driver.tick_rate(), 120);
}

#[test]
fn test_step_runs_one_tick_and_releases() {
    let mut driver = driver();

    driver.step().unwrap();
    driver.step().unwrap();

    assert_eq!(driver.simulation().seen, vec![0, 1]);
    assert_eq!(driver.tick_count(), 2);
    assert_eq!(driver.context().ticks(), 2);
}

#[test]
fn test_first_frame_runs_one_tick() {
    let mut driver = driver();
    // First frame assumes exactly one tick of elapsed time
    assert_eq!(driver.frame().unwrap(), 1);
    assert_eq!(driver.context().ticks(), 1);
}

#[test]
fn test_frame_catches_up_elapsed_time() {
    let mut driver = driver();
    driver.frame().unwrap();

    thread::sleep(Duration::from_millis(50));
    let ticks = driver.frame().unwrap();

    // 50ms at 60Hz is three ticks; allow for scheduler slack
    assert!(ticks >= 2, "expected catch-up ticks, got {ticks}");
    assert!(ticks <= 7, "delta clamp exceeded, got {ticks}");
    assert_eq!(driver.tick_count(), u64::from(ticks) + 1);
}

#[test]
fn test_frame_after_shutdown_runs_nothing() {
    let mut driver = driver();
    driver.shutdown();
    assert_eq!(driver.frame().unwrap(), 0);
    assert!(!driver.context().is_running());
    assert_eq!(driver.tick_count(), 0);
}

#[test]
fn test_closure_simulation() {
    let mut total = 0u64;
    {
        let mut driver = TickDriver::new(
            |tick: u64| -> Result<()> {
                total += tick;
                Ok(())
            },
            Arc::new(SyncContext::new()),
            RuntimeConfig::default(),
        );
        for _ in 0..4 {
            driver.step().unwrap();
        }
    }
    assert_eq!(total, 6);
}

#[test]
fn test_failed_tick_does_not_release() {
    let mut driver = TickDriver::new(
        |_tick: u64| -> Result<()> { bail!("simulation fault") },
        Arc::new(SyncContext::new()),
        RuntimeConfig::default(),
    );

    assert!(driver.step().is_err());
    assert_eq!(driver.tick_count(), 0);
    assert_eq!(driver.context().ticks(), 0);
}
