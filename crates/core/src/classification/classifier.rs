//! Service error classifier
//!
//! | Error | Operation | Verdict |
//! |-------|-----------|---------|
//! | not found | lookup, delete, get-attributes | `Absent` |
//! | conflict | create | remediate, then `RetryNow` (`Fatal` if remediation fails) |
//! | cooldown | create | `RetryAfter(cooldown)` |
//! | transport | any | `Fatal`, or `RetryAfter(transport_delay)` when enabled |
//! | anything else | any | `Fatal` with the original error |

use std::future::Future;
use std::time::Duration;

use courier_common::RetryVerdict;
use courier_domain::constants::{DEFAULT_COOLDOWN_SECONDS, DEFAULT_TRANSPORT_DELAY_MS};
use courier_domain::{CourierError, RetryConfig, Result};
use tracing::{debug, warn};

use super::table::{ErrorCategory, ErrorCodeTable};
use crate::action::Operation;

/// Classifier decision before remediation is taken into account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Treat as an empty result
    Absent,
    /// Delete the conflicting resource, then retry at once
    Remediate,
    /// Retry after waiting
    RetryAfter(Duration),
    /// Surface the error
    Fatal,
}

/// Maps failed calls to retry verdicts
#[derive(Debug, Clone)]
pub struct ServiceErrorClassifier {
    table: ErrorCodeTable,
    cooldown: Duration,
    transport_retry: bool,
    transport_delay: Duration,
}

impl Default for ServiceErrorClassifier {
    fn default() -> Self {
        Self {
            table: ErrorCodeTable::default(),
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECONDS),
            transport_retry: false,
            transport_delay: Duration::from_millis(DEFAULT_TRANSPORT_DELAY_MS),
        }
    }
}

impl ServiceErrorClassifier {
    pub fn new(table: ErrorCodeTable) -> Self {
        Self { table, ..Self::default() }
    }

    /// Classifier using the cooldown and transport settings of `config`
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            table: ErrorCodeTable::default(),
            cooldown: config.cooldown(),
            transport_retry: config.transport_retry,
            transport_delay: config.transport_delay(),
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: ErrorCodeTable) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Opt into retrying transport failures after `delay`
    #[must_use]
    pub fn with_transport_retry(mut self, delay: Duration) -> Self {
        self.transport_retry = true;
        self.transport_delay = delay;
        self
    }

    pub fn table(&self) -> &ErrorCodeTable {
        &self.table
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Classify `error` raised while attempting `operation`
    pub fn classify(&self, operation: Operation, error: &CourierError) -> Classification {
        match error {
            CourierError::Transport(_) if self.transport_retry => {
                Classification::RetryAfter(self.transport_delay)
            }
            CourierError::Service(service) => {
                match (self.table.category(service.code_suffix()), operation) {
                    (Some(ErrorCategory::NotFound), op) if op.tolerates_absence() => {
                        Classification::Absent
                    }
                    (Some(ErrorCategory::Conflict), Operation::Create) => Classification::Remediate,
                    (Some(ErrorCategory::Cooldown), Operation::Create) => {
                        Classification::RetryAfter(self.cooldown)
                    }
                    _ => Classification::Fatal,
                }
            }
            _ => Classification::Fatal,
        }
    }

    /// Verdict for a call that has no remediation step
    ///
    /// A conflict is fatal here.
    pub fn verdict<T>(&self, operation: Operation, error: CourierError) -> RetryVerdict<T, CourierError> {
        match self.classify(operation, &error) {
            Classification::Absent => {
                debug!(code = error.code_suffix(), "resource absent");
                RetryVerdict::Absent
            }
            Classification::RetryAfter(delay) => {
                debug!(code = error.code_suffix(), delay_ms = delay_ms(delay), "delayed retry");
                RetryVerdict::RetryAfter(delay)
            }
            Classification::Remediate | Classification::Fatal => RetryVerdict::Fatal(error),
        }
    }

    /// Verdict for a call whose conflicts are resolved by `remediate`
    ///
    /// `remediate` runs only for a conflict. Its success yields `RetryNow`,
    /// its failure yields `Fatal` carrying the remediation error.
    pub async fn verdict_with_remediation<T, F, Fut>(
        &self,
        operation: Operation,
        error: CourierError,
        remediate: F,
    ) -> RetryVerdict<T, CourierError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if self.classify(operation, &error) != Classification::Remediate {
            return self.verdict(operation, error);
        }

        debug!(code = error.code_suffix(), "conflicting resource, remediating");
        match remediate().await {
            Ok(()) => RetryVerdict::RetryNow,
            Err(remediation_error) => {
                warn!(error = %remediation_error, "remediation failed");
                RetryVerdict::Fatal(remediation_error)
            }
        }
    }
}

fn delay_ms(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
