//! Resource addressing
//!
//! A [`ResourceContext`] names one queue or topic on one service endpoint.
//! It starts unresolved (no resource path) and becomes resolved only by
//! deriving a new value through [`ResourceContext::resolved`] (or
//! [`ResourceContext::resolve_to`] for service-reported paths); nothing
//! mutates the path of an existing context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::errors::{CourierError, Result};
use crate::impl_domain_enum_conversions;

/// Kind of remote resource a context addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Queue,
    Topic,
}

impl_domain_enum_conversions!(ResourceKind {
    Queue => "queue",
    Topic => "topic",
});

/// Immutable addressing record threaded through every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContext {
    kind: ResourceKind,
    name: String,
    endpoint: String,
    resource_path: String,
    region: String,
    account: Option<String>,
    extensions: BTreeMap<String, String>,
}

impl ResourceContext {
    /// Unresolved context for `name` on `endpoint`
    pub fn new(kind: ResourceKind, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            endpoint: endpoint.into(),
            resource_path: String::new(),
            region: String::new(),
            account: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Unresolved queue context addressed with the client configuration
    pub fn queue(name: impl Into<String>, config: &ClientConfig) -> Self {
        Self::from_config(ResourceKind::Queue, name, config)
    }

    /// Unresolved topic context addressed with the client configuration
    pub fn topic(name: impl Into<String>, config: &ClientConfig) -> Self {
        Self::from_config(ResourceKind::Topic, name, config)
    }

    fn from_config(kind: ResourceKind, name: impl Into<String>, config: &ClientConfig) -> Self {
        let context = Self::new(kind, name, config.endpoint.clone()).with_region(config.region.clone());
        match &config.account {
            Some(account) => context.with_account(account.clone()),
            None => context,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Attach an arbitrary extension field
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Derive a resolved context carrying `resource_path`
    ///
    /// The receiver is left untouched.
    #[must_use]
    pub fn resolved(&self, resource_path: impl Into<String>) -> Self {
        Self { resource_path: resource_path.into(), ..self.clone() }
    }

    /// Derive a resolved context from a path reported by the service
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Decode` when the path is blank, since the
    /// derived context would still be unresolved.
    pub fn resolve_to(&self, resource_path: impl Into<String>) -> Result<Self> {
        let resource_path = resource_path.into();
        if resource_path.trim().is_empty() {
            return Err(CourierError::Decode(format!(
                "service returned an empty path for {} '{}'",
                self.kind, self.name
            )));
        }
        Ok(self.resolved(resource_path))
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Server-assigned path; empty while unresolved
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extensions.get(key).map(String::as_str)
    }

    pub fn extensions(&self) -> &BTreeMap<String, String> {
        &self.extensions
    }

    pub fn is_resolved(&self) -> bool {
        !self.resource_path.is_empty()
    }

    /// Resource path for a resource-scoped call
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Unresolved` for a context without a path.
    /// This is a caller mistake and is never retried.
    pub fn require_resolved(&self) -> Result<&str> {
        if self.is_resolved() {
            Ok(&self.resource_path)
        } else {
            Err(CourierError::Unresolved(self.name.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_is_unresolved() {
        let context = ResourceContext::new(ResourceKind::Queue, "jobs", "http://localhost:9324");
        assert!(!context.is_resolved());
        assert_eq!(context.resource_path(), "");
        assert_eq!(context.require_resolved(), Err(CourierError::Unresolved("jobs".into())));
    }

    #[test]
    fn resolved_derives_without_mutating_original() {
        let original = ResourceContext::new(ResourceKind::Queue, "jobs", "http://localhost:9324")
            .with_region("eu-west-1")
            .with_extension("owner", "billing");
        let resolved = original.resolved("/000000000000/jobs");

        assert!(!original.is_resolved());
        assert!(resolved.is_resolved());
        assert_eq!(resolved.require_resolved(), Ok("/000000000000/jobs"));
        assert_eq!(resolved.region(), "eu-west-1");
        assert_eq!(resolved.extension("owner"), Some("billing"));
        assert_eq!(resolved.name(), original.name());
    }

    #[test]
    fn blank_service_path_does_not_resolve() {
        let context = ResourceContext::new(ResourceKind::Topic, "events", "http://localhost:9324");

        assert!(matches!(context.resolve_to(""), Err(CourierError::Decode(_))));
        assert!(matches!(context.resolve_to("  "), Err(CourierError::Decode(_))));
        assert_eq!(context.resolve_to("topic:events").map(|c| c.is_resolved()), Ok(true));
    }

    #[test]
    fn config_constructors_copy_addressing() {
        let config = ClientConfig {
            endpoint: "https://queue.test".into(),
            region: "ap-south-1".into(),
            account: Some("123456789012".into()),
            ..ClientConfig::default()
        };

        let queue = ResourceContext::queue("jobs", &config);
        let topic = ResourceContext::topic("events", &config);

        assert_eq!(queue.kind(), ResourceKind::Queue);
        assert_eq!(topic.kind(), ResourceKind::Topic);
        assert_eq!(queue.endpoint(), "https://queue.test");
        assert_eq!(topic.region(), "ap-south-1");
        assert_eq!(queue.account(), Some("123456789012"));
    }

    #[test]
    fn resource_kind_round_trips_through_str() {
        assert_eq!(ResourceKind::Topic.to_string(), "topic");
        assert_eq!("QUEUE".parse::<ResourceKind>(), Ok(ResourceKind::Queue));
    }
}
