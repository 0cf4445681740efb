//! Error types used throughout the client

use std::time::Duration;

use courier_common::error::{ErrorClassification, ErrorSeverity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured failure reported by the remote service on a non-2xx response
///
/// Code and message are kept verbatim so callers can branch on the code.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message} (status {status})")]
pub struct ServiceError {
    code: String,
    message: String,
    status: u16,
}

impl ServiceError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self { code: code.into(), message: message.into(), status }
    }

    /// Full service-defined code, e.g. `AWS.SimpleQueueService.NonExistentQueue`
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Last dotted segment of the code with any `;`-separated tail removed
    ///
    /// `AWS.SimpleQueueService.NonExistentQueue;Sender` becomes
    /// `NonExistentQueue`.
    pub fn code_suffix(&self) -> &str {
        let head = self.code.split(';').next().unwrap_or_default();
        head.rsplit('.').next().unwrap_or(head)
    }

    /// Whether the service reported a server-side or throttling condition
    pub fn is_server_side(&self) -> bool {
        self.status >= 500 || self.status == 429
    }
}

/// Main error type for Courier
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CourierError {
    #[error("Service error: {0}")]
    Service(ServiceError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Integrity error: expected checksum {expected}, computed {actual}")]
    Integrity { expected: String, actual: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("{action} gave up after {attempts} attempts")]
    AttemptsExhausted { action: String, attempts: u32 },

    #[error("{action} cancelled after {attempts} attempts")]
    Cancelled { action: String, attempts: u32 },

    #[error("Resource '{0}' has no resource path; resolve or create it first")]
    Unresolved(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// The structured service error, when this failure came from the service
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(error) => Some(error),
            _ => None,
        }
    }

    /// Shorthand for `service_error().map(ServiceError::code_suffix)`
    pub fn code_suffix(&self) -> Option<&str> {
        self.service_error().map(ServiceError::code_suffix)
    }
}

impl From<ServiceError> for CourierError {
    fn from(error: ServiceError) -> Self {
        Self::Service(error)
    }
}

impl From<serde_json::Error> for CourierError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl ErrorClassification for CourierError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Service(error) => error.is_server_side(),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cancelled { .. } => ErrorSeverity::Info,
            Self::Transport(_) => ErrorSeverity::Warning,
            Self::Service(error) if error.is_server_side() => ErrorSeverity::Warning,
            Self::Integrity { .. } | Self::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Integrity { .. } | Self::Internal(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Service(error) if error.status() == 429 => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}

/// Result type alias for Courier operations
pub type Result<T> = std::result::Result<T, CourierError>;
