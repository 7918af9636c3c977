//! Time source abstraction for real and simulated time.
//!
//! The dispatcher and the device transition logic never call `Utc::now()` or
//! `thread::sleep` directly; they go through a [`TimeSource`]. Production code
//! uses [`RealTimeSource`]. [`SimulatedTimeSource`] jumps forward instantly on
//! `sleep` and remembers every requested sleep, which makes backoff schedules
//! observable in tests without waiting for them.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;

    /// Sleep for the specified duration (or simulate it)
    fn sleep(&self, duration: StdDuration);

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Fast-forward time source.
///
/// `sleep` advances the simulated clock by exactly the requested duration and
/// returns immediately.
pub struct SimulatedTimeSource {
    current: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<StdDuration>>,
}

impl SimulatedTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<StdDuration> {
        self.sleeps
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Move the clock without recording a sleep.
    pub fn advance(&self, duration: chrono::Duration) {
        if let Ok(mut current) = self.current.lock() {
            *current += duration;
        }
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        match self.current.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn sleep(&self, duration: StdDuration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX);
        self.advance(step);
    }

    fn is_simulated(&self) -> bool {
        true
    }
}
