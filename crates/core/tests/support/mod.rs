//! Shared test helpers for `courier-core` integration tests.
//!
//! These helpers wire real services to scripted collaborators so that tests
//! can focus on call sequences and outcomes instead of boilerplate.

#![allow(dead_code)]

pub mod fakes;

use std::sync::Arc;

use courier_common::testing::MockClock;
use courier_common::RetryPolicy;
use courier_core::{Dispatcher, QueueService, RequestExecutor, ServiceErrorClassifier, TopicService};
use courier_domain::{ClientConfig, ResourceContext};
pub use fakes::{checksum, ChecksumDigester, JsonTreeDecoder, RecordedCall, ScriptedInvoker};

pub const ENDPOINT: &str = "http://queue.test";

/// Services backed by a scripted invoker and virtual time
pub struct Harness {
    pub invoker: Arc<ScriptedInvoker>,
    pub clock: MockClock,
    pub queues: QueueService<MockClock>,
    pub topics: TopicService<MockClock>,
}

impl Harness {
    /// Harness with the default classifier and a budget of `max_attempts`
    pub fn new(max_attempts: u32) -> Self {
        Self::with_classifier(max_attempts, ServiceErrorClassifier::default())
    }

    pub fn with_classifier(max_attempts: u32, classifier: ServiceErrorClassifier) -> Self {
        let dispatcher = Self::dispatcher(max_attempts, classifier);
        Self::from_dispatcher(dispatcher)
    }

    pub fn dispatcher(
        max_attempts: u32,
        classifier: ServiceErrorClassifier,
    ) -> (Arc<ScriptedInvoker>, MockClock, Dispatcher<MockClock>) {
        let invoker = Arc::new(ScriptedInvoker::new());
        let clock = MockClock::new();
        let executor = RequestExecutor::new(
            invoker.clone(),
            Arc::new(JsonTreeDecoder),
            Arc::new(ChecksumDigester),
        );
        let policy = RetryPolicy::new(max_attempts, classifier.cooldown()).expect("valid policy");
        let dispatcher = Dispatcher::with_clock(executor, classifier, policy, clock.clone());
        (invoker, clock, dispatcher)
    }

    pub fn from_dispatcher(
        (invoker, clock, dispatcher): (Arc<ScriptedInvoker>, MockClock, Dispatcher<MockClock>),
    ) -> Self {
        let dispatcher = Arc::new(dispatcher);
        Self {
            invoker,
            clock,
            queues: QueueService::new(dispatcher.clone()),
            topics: TopicService::new(dispatcher),
        }
    }
}

pub fn config() -> ClientConfig {
    ClientConfig { endpoint: ENDPOINT.to_string(), ..ClientConfig::default() }
}

/// Unresolved queue context named `name`
pub fn queue(name: &str) -> ResourceContext {
    ResourceContext::queue(name, &config())
}

/// Queue context resolved to `/000000000000/<name>`
pub fn resolved_queue(name: &str) -> ResourceContext {
    queue(name).resolved(format!("/000000000000/{name}"))
}

pub fn topic(name: &str) -> ResourceContext {
    ResourceContext::topic(name, &config())
}

pub fn resolved_topic(name: &str) -> ResourceContext {
    topic(name).resolved(format!("topic:{name}"))
}
