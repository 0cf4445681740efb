//! Clock abstraction used by the retry controller
//!
//! The controller never calls `tokio::time::sleep` directly: every
//! suspension goes through a [`Clock`], so tests can substitute
//! [`MockClock`](crate::testing::MockClock) and observe delays without any
//! real time passing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Time source and suspension point for resilience primitives
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Suspend the calling task for `duration` without consuming CPU
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Implement Clock for Arc<T> where T: Clock for convenient sharing
#[async_trait]
impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}
