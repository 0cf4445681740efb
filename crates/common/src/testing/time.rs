//! Virtual time for deterministic tests
//!
//! [`MockClock`] implements [`Clock`] without touching the tokio timer:
//! `sleep` advances the simulated elapsed time and records the requested
//! duration, then returns immediately.
//!
//! # Examples
//!
//! ```
//! # tokio_test::block_on(async {
//! use std::time::Duration;
//!
//! use courier_common::resilience::Clock;
//! use courier_common::testing::MockClock;
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//!
//! clock.sleep(Duration::from_secs(60)).await;
//!
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(60));
//! assert_eq!(clock.sleeps(), vec![Duration::from_secs(60)]);
//! # });
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

pub use crate::resilience::{Clock, SystemClock};

/// Mock clock for deterministic testing
///
/// Clones share the same timeline, so a clone handed to the code under test
/// can be inspected from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl MockClock {
    /// Create a new mock clock
    ///
    /// The clock starts at the current real instant but only moves when
    /// advanced or slept on.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Advance the mock clock by a duration without recording a sleep
    pub fn advance(&self, duration: Duration) {
        *lock(&self.elapsed) += duration;
    }

    /// Get the simulated elapsed time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *lock(&self.elapsed)
    }

    /// Every duration passed to [`Clock::sleep`], in call order
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.sleeps).clone()
    }

    /// Number of sleeps requested so far
    #[must_use]
    pub fn sleep_count(&self) -> usize {
        lock(&self.sleeps).len()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        lock(&self.sleeps).push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_now() {
        let clock = MockClock::new();
        let start = clock.now();

        clock.advance(Duration::from_secs(5));

        assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
        assert_eq!(clock.sleep_count(), 0);
    }

    #[tokio::test]
    async fn sleep_records_and_advances() {
        let clock = MockClock::new();

        clock.sleep(Duration::from_secs(1)).await;
        clock.sleep(Duration::from_secs(2)).await;

        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn clones_share_timeline() {
        let clock = MockClock::new();
        let handle = clock.clone();

        handle.sleep(Duration::from_secs(60)).await;

        assert_eq!(clock.elapsed(), Duration::from_secs(60));
        assert_eq!(clock.sleep_count(), 1);
    }
}
