//! Port interfaces for the remote service collaborators
//!
//! The core never performs I/O itself. Transport, body decoding and hashing
//! are reached through these traits; `courier-infra` provides the default
//! adapters and tests substitute scripted fakes.

use async_trait::async_trait;
use courier_domain::{DigestAlgorithm, ResourceContext, ResponseNode, Result};

use crate::params::Params;

/// Raw response of a successful (2xx) call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self { status: 200, body: body.into() }
    }
}

/// Trait for issuing one request against the service
#[async_trait]
pub trait HttpInvoker: Send + Sync {
    /// Invoke `action` on the resource addressed by `context`
    ///
    /// Implementations return `CourierError::Service` for any non-2xx
    /// response and `CourierError::Transport` when no response arrived.
    async fn invoke(
        &self,
        action: &str,
        context: &ResourceContext,
        params: &Params,
    ) -> Result<RawResponse>;
}

/// Trait for turning a raw body into a response tree
pub trait ResponseDecoder: Send + Sync {
    /// Decode a response body
    fn decode(&self, body: &[u8]) -> Result<ResponseNode>;
}

/// Trait for computing message body checksums
pub trait Digester: Send + Sync {
    /// Lowercase hex digest of `bytes`
    fn digest(&self, algorithm: DigestAlgorithm, bytes: &[u8]) -> String;
}
