//! Tick alignment between a running audio thread and the simulation

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::SyncConfig;
use crate::runtime::{RuntimeConfig, TickDriver};
use crate::sync::WaitStrategy;

use super::test_utils::*;

/// 1024-frame blocks against an 800-sample tick: every fifth boundary is a skip
#[test]
fn test_drift_schedule_with_oversized_blocks() {
    let (context, audio) = spawn_headless(&SyncConfig::default(), 1024);

    assert!(wait_until(TIMEOUT, || context.is_blocked()));
    for _ in 0..10 {
        assert!(context.release_tick());
        assert!(wait_until(TIMEOUT, || context.is_blocked()));
    }

    // Ten releases let twelve blocks through (two of them skips); the
    // thirteenth is held now.
    let status = context.status();
    assert_eq!(audio.blocks_processed(), 12);
    assert_eq!(status.holds, 11);
    assert_eq!(status.skips, 2);
    assert_eq!(status.accumulated_error, 640);
    assert_eq!(status.ticks, 10);

    audio.stop();
}

/// Blocks that divide the target never drift and never skip
#[test]
fn test_even_blocks_hold_once_per_tick() {
    let (context, audio) = spawn_headless(&SyncConfig::default(), 200);

    assert!(wait_until(TIMEOUT, || context.is_blocked()));
    for _ in 0..25 {
        assert!(context.release_tick());
        assert!(wait_until(TIMEOUT, || context.is_blocked()));
    }

    let status = context.status();
    assert_eq!(audio.frames_processed(), 25 * 800);
    assert_eq!(status.holds, 26);
    assert_eq!(status.skips, 0);
    assert_eq!(status.accumulated_error, 0);
    assert_eq!(status.recorded_samples, 800);
}

#[test]
fn test_condvar_wait_keeps_same_schedule() {
    let config = SyncConfig {
        wait: WaitStrategy::Condvar,
        ..SyncConfig::default()
    };
    let (context, audio) = spawn_headless(&config, 1024);

    assert!(wait_until(TIMEOUT, || context.is_blocked()));
    for _ in 0..10 {
        assert!(context.release_tick());
        assert!(wait_until(TIMEOUT, || context.is_blocked()));
    }

    assert_eq!(audio.blocks_processed(), 12);
    assert_eq!(context.status().skips, 2);
}

/// The driver releases only after the simulation's tick has run
#[test]
fn test_driver_step_releases_after_tick() {
    let (context, audio) = spawn_headless(&SyncConfig::default(), 800);

    let holds_at_tick = Arc::new(AtomicU64::new(0));
    let observed = holds_at_tick.clone();
    let probe = context.clone();
    let mut driver = TickDriver::new(
        move |_tick: u64| -> anyhow::Result<()> {
            // The audio thread is still held while the tick runs
            assert!(probe.is_blocked());
            observed.store(probe.status().holds, Ordering::Relaxed);
            Ok(())
        },
        context.clone(),
        RuntimeConfig::default(),
    );

    for tick in 1..=5 {
        assert!(wait_until(TIMEOUT, || context.is_blocked()));
        driver.step().unwrap();
        assert_eq!(holds_at_tick.load(Ordering::Relaxed), tick);
        assert!(wait_until(TIMEOUT, || context.status().holds == tick + 1));
    }

    assert_eq!(driver.tick_count(), 5);
    drop(audio);
    assert!(!context.is_running());
}

/// Bypass lets the audio thread free-run without touching the counters
#[test]
fn test_bypass_free_runs_audio() {
    let config = SyncConfig {
        start_bypassed: true,
        ..SyncConfig::default()
    };
    let (context, audio) = spawn_headless(&config, 1024);

    assert!(wait_until(TIMEOUT, || audio.blocks_processed() > 100));
    let status = context.status();
    assert_eq!(status.holds, 0);
    assert_eq!(status.recorded_samples, 0);
    assert!(!status.blocked);

    // Re-enabling lockstep gates again at the next boundary
    context.set_bypassed(false);
    assert!(wait_until(TIMEOUT, || context.is_blocked()));
    assert_eq!(context.status().holds, 1);
}
