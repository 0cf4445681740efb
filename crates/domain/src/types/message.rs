//! Message and confirmation types

use serde::{Deserialize, Serialize};

use super::context::ResourceContext;

/// A received message
///
/// Transient view of server-side state: it exists only between receive and
/// delete and carries the receipt handle needed to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub body: String,
    pub receipt_handle: Option<String>,
    /// Checksum reported by the service, verified against the body on receive
    pub checksum: String,
}

/// Acknowledgement of a single send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendConfirmation {
    pub message_id: String,
    /// Locally computed digest of the sent body
    pub checksum: String,
}

/// Acknowledgement of one entry of a batch send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfirmation {
    /// Entry id as encoded in the request (`1`, `2`, ...)
    pub entry_id: String,
    pub message_id: String,
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfirmation {
    pub message_id: String,
}

/// Where a topic subscription delivers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionEndpoint {
    /// A queue managed through this client; eligible for the access policy
    Queue(ResourceContext),
    /// Any other address (URL, e-mail, ...) passed through verbatim
    Address(String),
}

impl SubscriptionEndpoint {
    pub fn as_queue(&self) -> Option<&ResourceContext> {
        match self {
            Self::Queue(context) => Some(context),
            Self::Address(_) => None,
        }
    }
}

/// Result of a subscribe call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: String,
    pub protocol: String,
    pub endpoint: String,
    pub raw_delivery: bool,
}

/// Optional receive parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveOptions {
    /// Long-poll duration in seconds
    pub wait_time_seconds: Option<u32>,
    /// Seconds the received message stays hidden from other receivers
    pub visibility_timeout: Option<u32>,
}

impl ReceiveOptions {
    pub fn long_poll(wait_time_seconds: u32) -> Self {
        Self { wait_time_seconds: Some(wait_time_seconds), ..Self::default() }
    }

    pub fn with_visibility_timeout(mut self, seconds: u32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }
}
