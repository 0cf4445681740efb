//! Resilience primitives for remote calls
//!
//! - **Retry controller**: a bounded loop driven by per-attempt
//!   [`RetryVerdict`]s instead of error predicates, so that "absent" and
//!   "wait for the service cooldown" are first-class outcomes
//! - **Clock**: the single suspension point, swappable for virtual time
//!
//! The controller is generic over the error type and knows nothing about
//! the remote service; classification of service errors into verdicts lives
//! with the service client.

pub mod clock;
pub mod retry;

pub use clock::{Clock, SystemClock};
pub use retry::{
    Lookup, RetryController, RetryError, RetryOutcome, RetryPolicy, RetryResult, RetryVerdict,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
