//! Shared synchronization context and the audio-side wait

use std::hint;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Upper bound on one condvar sleep, so a missed wakeup costs at most this long.
const CONDVAR_POLL: Duration = Duration::from_millis(1);

/// How a held audio thread waits for the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitStrategy {
    /// Busy-wait on the calling thread.
    ///
    /// The backend's own mixer thread stops with it, so nothing downstream
    /// keeps producing audio during the hold. Burns a core while waiting.
    #[default]
    Spin,
    /// Sleep on a condition variable until released.
    ///
    /// Frees the CPU, but the OS may deschedule the backend's thread, which
    /// changes how the backend behaves around the hold (possible underruns
    /// after wakeup). Meant for non-real-time hosts.
    Condvar,
}

/// Why a hold ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateExit {
    /// The simulation cleared `blocked`.
    Released,
    /// `running` went false before a release arrived.
    Shutdown,
}

/// Point-in-time view of the shared state, for status lines and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStatus {
    /// Process still live
    pub running: bool,
    /// Audio thread currently held
    pub blocked: bool,
    /// Processor installed but inactive
    pub bypassed: bool,
    /// Samples recorded since the last tick boundary (as last published)
    pub recorded_samples: u64,
    /// Surplus samples carried across boundaries (as last published)
    pub accumulated_error: u64,
    /// Ticks the simulation has completed
    pub ticks: u64,
    /// Holds the audio thread has entered
    pub holds: u64,
    /// Catch-up skips taken
    pub skips: u64,
}

/// State shared between the audio thread and the simulation thread.
///
/// Wrap in an `Arc` and hand one clone to each side. The audio side calls
/// [`hold`](Self::hold); the simulation side calls
/// [`release_tick`](Self::release_tick) once per tick and
/// [`shutdown`](Self::shutdown) on exit.
#[derive(Debug)]
pub struct SyncContext {
    blocked: AtomicBool,
    running: AtomicBool,
    bypassed: AtomicBool,

    // Published by the audio thread after each block; read-only elsewhere.
    recorded_samples: AtomicU64,
    accumulated_error: AtomicU64,
    holds: AtomicU64,
    skips: AtomicU64,

    ticks: AtomicU64,

    wake: (Mutex<()>, Condvar),
}

impl Default for SyncContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncContext {
    /// Create a running, unblocked, active context.
    pub fn new() -> Self {
        Self {
            blocked: AtomicBool::new(false),
            running: AtomicBool::new(true),
            bypassed: AtomicBool::new(false),
            recorded_samples: AtomicU64::new(0),
            accumulated_error: AtomicU64::new(0),
            holds: AtomicU64::new(0),
            skips: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            wake: (Mutex::new(()), Condvar::new()),
        }
    }

    // ========================================================================
    // Audio side
    // ========================================================================

    /// Hold the calling thread until the simulation releases it, the
    /// processor is bypassed, or the process shuts down.
    ///
    /// `blocked` is false again when this returns, whichever way it ended.
    /// Leaving because of bypass counts as a release.
    pub fn hold(&self, strategy: WaitStrategy) -> GateExit {
        self.holds.fetch_add(1, Ordering::Relaxed);
        self.blocked.store(true, Ordering::Release);

        match strategy {
            WaitStrategy::Spin => {
                while self.is_gated() {
                    hint::spin_loop();
                }
            }
            WaitStrategy::Condvar => self.wait_condvar(),
        }

        // Still set only when we left because of shutdown or bypass.
        if self.blocked.swap(false, Ordering::AcqRel) && !self.is_running() {
            GateExit::Shutdown
        } else {
            GateExit::Released
        }
    }

    fn is_gated(&self) -> bool {
        self.blocked.load(Ordering::Acquire) && self.is_running() && !self.is_bypassed()
    }

    fn wait_condvar(&self) {
        let (lock, cvar) = &self.wake;
        let mut guard = lock.lock().unwrap_or_else(|e| {
            warn!("Sync gate mutex poisoned; continuing");
            e.into_inner()
        });
        while self.is_gated() {
            guard = match cvar.wait_timeout(guard, CONDVAR_POLL) {
                Ok((guard, _)) => guard,
                Err(e) => {
                    warn!("Sync gate condvar wait mutex poisoned; continuing");
                    e.into_inner().0
                }
            };
        }
    }

    pub(super) fn publish(&self, recorded_samples: u64, accumulated_error: u64) {
        self.recorded_samples.store(recorded_samples, Ordering::Relaxed);
        self.accumulated_error.store(accumulated_error, Ordering::Relaxed);
    }

    pub(super) fn count_skip(&self) {
        self.skips.fetch_add(1, Ordering::Relaxed);
    }

    // ========================================================================
    // Simulation side
    // ========================================================================

    /// Mark the end of one simulation tick and let a held audio thread continue.
    ///
    /// Call exactly once per tick, after the tick's state has been consumed.
    /// Returns `true` if the audio thread was being held.
    pub fn release_tick(&self) -> bool {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        let was_blocked = self.blocked.swap(false, Ordering::AcqRel);
        if was_blocked {
            self.notify();
        }
        was_blocked
    }

    /// Stop the process-wide run; any hold in progress ends promptly.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            debug!("Sync context shutting down");
        }
        self.notify();
    }

    /// Enable or disable the processor without removing it from the backend.
    pub fn set_bypassed(&self, bypassed: bool) {
        self.bypassed.store(bypassed, Ordering::Release);
        if bypassed {
            // A held thread must not wait for ticks that no longer gate it.
            self.release_hold();
        }
    }

    fn release_hold(&self) {
        if self.blocked.swap(false, Ordering::AcqRel) {
            self.notify();
        }
    }

    fn notify(&self) {
        // Taking the lock orders this wakeup after a waiter's condition check.
        let (lock, cvar) = &self.wake;
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        cvar.notify_all();
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Whether the process is still live
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the audio thread is currently held
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }

    /// Whether the processor is currently inactive
    pub fn is_bypassed(&self) -> bool {
        self.bypassed.load(Ordering::Acquire)
    }

    /// Ticks completed by the simulation
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Snapshot of flags and published counters.
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            running: self.is_running(),
            blocked: self.is_blocked(),
            bypassed: self.is_bypassed(),
            recorded_samples: self.recorded_samples.load(Ordering::Relaxed),
            accumulated_error: self.accumulated_error.load(Ordering::Relaxed),
            ticks: self.ticks(),
            holds: self.holds.load(Ordering::Relaxed),
            skips: self.skips.load(Ordering::Relaxed),
        }
    }
}
