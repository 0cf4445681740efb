//! Verdict-driven retry controller
//!
//! A unit of work performs exactly one remote call and reports what should
//! happen next as a [`RetryVerdict`]. The controller turns that verdict into
//! control flow: loop immediately, suspend for a fixed delay, stop with an
//! explicit absence, stop with the value, or stop with the error.
//!
//! The controller holds no state between invocations. Everything it needs
//! for one run (attempt counter, accumulated delay) lives on the stack of
//! [`RetryController::run_with_outcome`].
//!
//! # Example
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use courier_common::resilience::{Lookup, RetryController, RetryPolicy, RetryVerdict};
//! use tokio_util::sync::CancellationToken;
//!
//! let controller = RetryController::new(RetryPolicy::default());
//! let cancel = CancellationToken::new();
//!
//! let result = controller
//!     .run(&cancel, "lookup", || async { RetryVerdict::<u32, String>::Succeed(7) })
//!     .await;
//!
//! assert_eq!(result.ok(), Some(Lookup::Found(7)));
//! # });
//! ```

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use crate::error::{ErrorClassification, ErrorSeverity};

/// Default number of attempts for one logical operation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay used for delayed-retry verdicts (service cooldown window)
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// What the controller should do after one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryVerdict<T, E> {
    /// The attempt produced a value
    Succeed(T),
    /// Run the unit again without waiting
    RetryNow,
    /// Run the unit again after the given delay
    RetryAfter(Duration),
    /// The target does not exist; treated as an empty result
    Absent,
    /// Stop and surface the error
    Fatal(E),
}

impl<T, E> RetryVerdict<T, E> {
    /// Whether this verdict ends the retry loop
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeed(_) | Self::Absent | Self::Fatal(_))
    }
}

/// Result of an operation that may legitimately find nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup<T> {
    /// The operation produced a value
    Found(T),
    /// The target was absent
    Absent,
}

impl<T> Lookup<T> {
    /// Returns `true` when a value is present
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns `true` when the target was absent
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Convert into an `Option`, dropping the absence distinction
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Map the contained value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::Absent => Lookup::Absent,
        }
    }

    /// Borrow the contained value
    pub const fn as_ref(&self) -> Lookup<&T> {
        match self {
            Self::Found(value) => Lookup::Found(value),
            Self::Absent => Lookup::Absent,
        }
    }
}

impl<T, E> Lookup<Result<T, E>> {
    /// Turn a lookup of a result into a result of a lookup
    ///
    /// # Errors
    ///
    /// Returns the contained error of a `Found(Err(_))`.
    pub fn transpose(self) -> Result<Lookup<T>, E> {
        match self {
            Self::Found(result) => result.map(Lookup::Found),
            Self::Absent => Ok(Lookup::Absent),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Found)
    }
}

/// Errors surfaced by the retry controller
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The unit kept asking for retries until the attempt budget ran out
    #[error("retry budget exhausted after {attempts} attempts")]
    AttemptsExhausted { attempts: u32 },

    /// The caller cancelled the loop before a terminal verdict
    #[error("operation cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    /// The unit reported a non-retryable failure
    #[error("{0}")]
    Fatal(E),

    /// The retry policy configuration is invalid
    #[error("invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

impl<E: ErrorClassification> ErrorClassification for RetryError<E> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Fatal(inner) => inner.is_retryable(),
            Self::AttemptsExhausted { .. }
            | Self::Cancelled { .. }
            | Self::InvalidConfiguration { .. } => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Fatal(inner) => inner.severity(),
            Self::Cancelled { .. } => ErrorSeverity::Info,
            Self::AttemptsExhausted { .. } | Self::InvalidConfiguration { .. } => {
                ErrorSeverity::Error
            }
        }
    }

    fn is_critical(&self) -> bool {
        match self {
            Self::Fatal(inner) => inner.is_critical(),
            _ => false,
        }
    }
}

/// Attempt budget and delay configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts (first try included), at least 1
    pub max_attempts: u32,
    /// Fixed delay applied to delayed-retry verdicts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, delay: DEFAULT_RETRY_DELAY }
    }
}

impl RetryPolicy {
    /// Create a validated policy
    ///
    /// # Errors
    ///
    /// Returns `RetryError::InvalidConfiguration` when `max_attempts` is 0.
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self, RetryError<Infallible>> {
        let policy = Self { max_attempts, delay };
        policy.validate()?;
        Ok(policy)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `RetryError::InvalidConfiguration` when `max_attempts` is 0.
    pub fn validate(&self) -> Result<(), RetryError<Infallible>> {
        if self.max_attempts == 0 {
            return Err(RetryError::InvalidConfiguration {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Outcome of one controller run including summary statistics
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<Lookup<T>, E>,
    pub attempts: u32,
    pub total_delay: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> RetryResult<Lookup<T>, E> {
        self.result
    }
}

/// Executes a unit of work under a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryController<C: Clock = SystemClock> {
    policy: RetryPolicy,
    clock: C,
}

impl RetryController<SystemClock> {
    /// Create a controller backed by the real clock
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy, clock: SystemClock }
    }
}

impl<C: Clock> RetryController<C> {
    /// Create a controller with a custom clock (virtual time in tests)
    pub const fn with_clock(policy: RetryPolicy, clock: C) -> Self {
        Self { policy, clock }
    }

    /// The policy this controller enforces
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The clock this controller suspends on
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Run `unit` until it yields a terminal verdict
    ///
    /// # Errors
    ///
    /// - `RetryError::Fatal` with the unit's error on a fatal verdict
    /// - `RetryError::AttemptsExhausted` when the budget runs out
    /// - `RetryError::Cancelled` when `cancel` fires first
    pub async fn run<F, Fut, T, E>(
        &self,
        cancel: &CancellationToken,
        operation: &str,
        unit: F,
    ) -> RetryResult<Lookup<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RetryVerdict<T, E>>,
        E: fmt::Display,
    {
        self.run_with_outcome(cancel, operation, unit).await.into_result()
    }

    /// Run `unit` and return the outcome with attempt statistics
    pub async fn run_with_outcome<F, Fut, T, E>(
        &self,
        cancel: &CancellationToken,
        operation: &str,
        mut unit: F,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RetryVerdict<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0u32;
        let mut total_delay = Duration::ZERO;

        let finish = |result, attempts, total_delay| RetryOutcome { result, attempts, total_delay };

        loop {
            if cancel.is_cancelled() {
                info!(operation, attempts, "retry loop cancelled");
                return finish(Err(RetryError::Cancelled { attempts }), attempts, total_delay);
            }

            attempts += 1;
            debug!(operation, attempt = attempts, max_attempts, "executing attempt");

            let delay = match unit().await {
                RetryVerdict::Succeed(value) => {
                    if attempts > 1 {
                        debug!(operation, attempts, "operation succeeded after retries");
                    }
                    return finish(Ok(Lookup::Found(value)), attempts, total_delay);
                }
                RetryVerdict::Absent => {
                    debug!(operation, attempts, "target absent");
                    return finish(Ok(Lookup::Absent), attempts, total_delay);
                }
                RetryVerdict::Fatal(error) => {
                    warn!(operation, attempts, error = %error, "operation failed");
                    return finish(Err(RetryError::Fatal(error)), attempts, total_delay);
                }
                RetryVerdict::RetryNow => None,
                RetryVerdict::RetryAfter(delay) => Some(delay),
            };

            if attempts >= max_attempts {
                warn!(operation, attempts, "retry budget exhausted");
                return finish(
                    Err(RetryError::AttemptsExhausted { attempts }),
                    attempts,
                    total_delay,
                );
            }

            if let Some(delay) = delay {
                info!(
                    operation,
                    attempt = attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "waiting before retry"
                );
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        info!(operation, attempts, "retry wait cancelled");
                        return finish(Err(RetryError::Cancelled { attempts }), attempts, total_delay);
                    }
                    () = self.clock.sleep(delay) => {
                        total_delay += delay;
                    }
                }
            } else {
                debug!(operation, attempt = attempts, "retrying immediately");
            }
        }
    }
}
