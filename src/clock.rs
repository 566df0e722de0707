//! Time sources for timestamping person observations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Source of monotonically non-decreasing timestamps, in seconds.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time in seconds.
    fn now(&self) -> f64;
}

/// Wall clock measured from the moment the clock was created.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock for simulations and tests.
///
/// Clones share the same time, so a handle kept by the caller can advance the
/// clock seen by a predictor.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    // f64 bits
    seconds: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            seconds: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.seconds.store(seconds.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.seconds.load(Ordering::SeqCst))
    }
}

/// Shared default clock handle.
pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock::new())
}
