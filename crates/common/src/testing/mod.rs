//! Testing utilities and helpers
//!
//! - **[`time`]**: virtual clock used to observe retry waits without real
//!   delays
//!
//! ## Usage
//!
//! ```rust
//! use courier_common::resilience::{RetryController, RetryPolicy};
//! use courier_common::testing::MockClock;
//!
//! let clock = MockClock::new();
//! let controller = RetryController::with_clock(RetryPolicy::default(), clock.clone());
//! assert_eq!(controller.policy().max_attempts, 5);
//! assert_eq!(clock.sleep_count(), 0);
//! ```

pub mod time;

pub use time::{Clock, MockClock, SystemClock};
