//! Default client wiring
//!
//! [`CourierClient`] connects the reqwest transport, the JSON decoder and the
//! hash digester to one shared [`Dispatcher`] and hands out queue and topic
//! services bound to it.
//!
//! The client token is a shutdown signal for every service it hands out. To
//! abandon a single operation, scope a service to
//! [`CourierClient::operation_token`] and cancel that token instead:
//!
//! ```no_run
//! # async fn demo(client: courier_infra::CourierClient) -> courier_domain::Result<()> {
//! let token = client.operation_token();
//! let queues = client.queues().with_cancellation(token.clone());
//! let jobs = client.queue("jobs");
//! // token.cancel() stops this create without touching other callers
//! queues.create(&jobs, &Default::default()).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use courier_core::{Dispatcher, QueueService, RequestExecutor, TopicService};
use courier_domain::{ClientConfig, ResourceContext, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config;
use crate::decoding::JsonDecoder;
use crate::hashing::HashDigester;
use crate::http::HttpClient;

/// Queue and topic services over the default adapters
#[derive(Clone)]
pub struct CourierClient {
    config: ClientConfig,
    queues: QueueService,
    topics: TopicService,
    cancel: CancellationToken,
}

impl CourierClient {
    /// Build a client for `config`
    ///
    /// # Errors
    /// Returns `CourierError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::with_cancellation(config, CancellationToken::new())
    }

    /// Build a client whose retry loops all stop when `token` is cancelled
    ///
    /// # Errors
    /// Same as [`CourierClient::from_config`].
    pub fn with_cancellation(config: ClientConfig, token: CancellationToken) -> Result<Self> {
        config.validate()?;

        let executor = RequestExecutor::new(
            Arc::new(HttpClient::from_config(&config.http)?),
            Arc::new(JsonDecoder::new()),
            Arc::new(HashDigester::new()),
        );
        let dispatcher = Arc::new(Dispatcher::from_config(executor, &config)?);

        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            max_attempts = config.retry.max_attempts,
            digest = %config.digest,
            "courier client ready"
        );

        Ok(Self {
            queues: QueueService::new(dispatcher.clone()).with_cancellation(token.child_token()),
            topics: TopicService::new(dispatcher).with_cancellation(token.child_token()),
            config,
            cancel: token,
        })
    }

    /// Build a client from the environment or a probed config file
    ///
    /// # Errors
    /// Returns `CourierError::Config` if no valid configuration is found.
    pub fn load() -> Result<Self> {
        Self::from_config(config::load()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn queues(&self) -> &QueueService {
        &self.queues
    }

    pub fn topics(&self) -> &TopicService {
        &self.topics
    }

    /// Unresolved context for the queue `name`
    pub fn queue(&self, name: impl Into<String>) -> ResourceContext {
        ResourceContext::queue(name, &self.config)
    }

    /// Unresolved context for the topic `name`
    pub fn topic(&self, name: impl Into<String>) -> ResourceContext {
        ResourceContext::topic(name, &self.config)
    }

    /// Token for one caller's operations
    ///
    /// Cancelling it stops only services scoped to it through
    /// `with_cancellation`. It is also cancelled by [`CourierClient::cancel`].
    pub fn operation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Shut the client down
    ///
    /// Pending retry loops of every service handed out by this client end
    /// with `CourierError::Cancelled`, and so does every later call.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for CourierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierClient")
            .field("endpoint", &self.config.endpoint)
            .field("region", &self.config.region)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
