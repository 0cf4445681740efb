//! Client configuration
//!
//! Endpoint and credential-scope settings are plain values threaded into the
//! services and stored in every [`ResourceContext`](crate::ResourceContext);
//! nothing here is process-wide state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COOLDOWN_SECONDS, DEFAULT_ENDPOINT, DEFAULT_HTTP_TIMEOUT_SECONDS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REGION, DEFAULT_TRANSPORT_DELAY_MS, DEFAULT_USER_AGENT,
};
use crate::errors::{CourierError, Result};
use crate::impl_domain_enum_conversions;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service endpoint, e.g. `https://queue.example.com`
    pub endpoint: String,
    pub region: String,
    pub account: Option<String>,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub digest: DigestAlgorithm,
}

/// HTTP adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per logical operation, at least 1
    pub max_attempts: u32,
    /// Wait applied when the service refuses to recreate a deleted name
    pub cooldown_seconds: u64,
    /// Retry transport failures instead of surfacing them
    pub transport_retry: bool,
    pub transport_delay_ms: u64,
}

/// Message body digest algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl_domain_enum_conversions!(DigestAlgorithm {
    Sha256 => "sha256",
    Blake3 => "blake3",
});

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: DEFAULT_REGION.to_string(),
            account: None,
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            digest: DigestAlgorithm::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            transport_retry: false,
            transport_delay_ms: DEFAULT_TRANSPORT_DELAY_MS,
        }
    }
}

impl ClientConfig {
    /// Check the values a client cannot work without
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(CourierError::Config("endpoint must not be empty".into()));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(CourierError::Config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.region.trim().is_empty() {
            return Err(CourierError::Config("region must not be empty".into()));
        }
        if self.http.timeout_seconds == 0 {
            return Err(CourierError::Config("http.timeout_seconds must be greater than 0".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(CourierError::Config("retry.max_attempts must be greater than 0".into()));
        }
        Ok(())
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl RetryConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn transport_delay(&self) -> Duration {
        Duration::from_millis(self.transport_delay_ms)
    }
}
