//! Topic service - topic lifecycle, publishing and subscriptions

use std::collections::BTreeMap;
use std::sync::Arc;

use courier_common::{Clock, Lookup, RetryVerdict, SystemClock};
use courier_domain::constants::{ATTR_POLICY, ATTR_RAW_MESSAGE_DELIVERY, SUBJECT_MAX_CHARS};
use courier_domain::{
    CourierError, PublishConfirmation, ResourceContext, Result, Subscription, SubscriptionEndpoint,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::policy::grant_topic_delivery;
use crate::action::Action;
use crate::dispatch::{require_found, Dispatcher};
use crate::executor::RequestExecutor;
use crate::params::Params;
use crate::queue::QueueService;

/// Topic operations
///
/// Holds a [`QueueService`] on the same dispatcher and cancellation token
/// for queue subscriptions.
pub struct TopicService<C: Clock = SystemClock> {
    dispatcher: Arc<Dispatcher<C>>,
    queues: QueueService<C>,
    cancel: CancellationToken,
}

impl<C: Clock> Clone for TopicService<C> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            queues: self.queues.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<C: Clock> TopicService<C> {
    /// Create a new topic service
    pub fn new(dispatcher: Arc<Dispatcher<C>>) -> Self {
        let queues = QueueService::new(dispatcher.clone());
        let cancel = queues.cancellation().clone();
        Self { dispatcher, queues, cancel }
    }

    /// Copy of this service whose operations stop when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            queues: self.queues.with_cancellation(token.clone()),
            cancel: token,
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Look up the topic named by `context`
    #[instrument(skip_all, fields(topic = context.name()))]
    pub async fn resolve(&self, context: &ResourceContext) -> Result<Lookup<ResourceContext>> {
        let action = Action::GetTopic;
        let params = Params::new().with("Name", context.name());

        self.dispatcher
            .call(&self.cancel, action, context, &params, |tree| {
                RequestExecutor::extract(tree, action, "TopicPath")?
                    .map(|path| context.resolve_to(path))
                    .transpose()
            })
            .await
    }

    /// Create the topic named by `context`
    ///
    /// Conflicts and cooldowns are handled as for queues.
    #[instrument(skip_all, fields(topic = context.name()))]
    pub async fn create(
        &self,
        context: &ResourceContext,
        options: &BTreeMap<String, String>,
    ) -> Result<ResourceContext> {
        let action = Action::CreateTopic;
        let mut params = Params::new().with("Name", context.name());
        params.push_attributes(options.iter().map(|(name, value)| (name.clone(), value.clone())));

        let dispatcher = self.dispatcher.as_ref();
        let params = &params;
        let lookup = dispatcher
            .run(&self.cancel, action, move || async move {
                let created = dispatcher
                    .executor()
                    .execute(action, context, params)
                    .await
                    .and_then(|tree| RequestExecutor::require(&tree, action, "TopicPath"))
                    .and_then(|path| context.resolve_to(path));
                match created {
                    Ok(resolved) => RetryVerdict::Succeed(resolved),
                    Err(error) => {
                        dispatcher
                            .classifier()
                            .verdict_with_remediation(action.operation(), error, || async move {
                                info!(topic = context.name(), "deleting conflicting topic");
                                self.delete(context).await.map(|_| ())
                            })
                            .await
                    }
                }
            })
            .await?;

        let created = require_found(action, lookup)?;
        info!(path = created.resource_path(), "topic created");
        Ok(created)
    }

    /// Delete the topic; `Absent` if it does not exist
    #[instrument(skip_all, fields(topic = context.name()))]
    pub async fn delete(&self, context: &ResourceContext) -> Result<Lookup<()>> {
        let target = if context.is_resolved() {
            context.clone()
        } else {
            match self.resolve(context).await? {
                Lookup::Found(resolved) => resolved,
                Lookup::Absent => return Ok(Lookup::Absent),
            }
        };

        self.dispatcher
            .call(&self.cancel, Action::DeleteTopic, &target, &Params::new(), |_| Ok(Lookup::Found(())))
            .await
    }

    /// All topic attributes, or `Absent` for a topic that no longer exists
    #[instrument(skip_all, fields(topic = context.name()))]
    pub async fn get_attributes(
        &self,
        context: &ResourceContext,
    ) -> Result<Lookup<BTreeMap<String, String>>> {
        let action = Action::GetTopicAttributes;
        self.dispatcher
            .call(&self.cancel, action, context, &Params::new(), |tree| {
                Ok(Lookup::Found(RequestExecutor::attributes(tree, action)))
            })
            .await
    }

    /// Publish a message
    ///
    /// A subject longer than the service limit is cut to its first
    /// characters (not bytes).
    #[instrument(skip_all, fields(topic = topic.name()))]
    pub async fn publish(
        &self,
        topic: &ResourceContext,
        message: &str,
        subject: Option<&str>,
    ) -> Result<PublishConfirmation> {
        let action = Action::Publish;
        let mut params = Params::new().with("Message", message);
        params.push_opt("Subject", subject.map(truncate_subject));

        self.dispatcher
            .call_found(&self.cancel, action, topic, &params, |tree| {
                Ok(PublishConfirmation { message_id: RequestExecutor::require(tree, action, "MessageId")? })
            })
            .await
    }

    /// Subscribe `endpoint` to the topic
    ///
    /// Raw delivery is only enabled when requested. For a queue endpoint
    /// with raw delivery the queue policy is extended to let the topic send
    /// to it before subscribing.
    ///
    /// # Errors
    ///
    /// `CourierError::InvalidInput` when the endpoint queue does not exist;
    /// nothing is subscribed in that case.
    #[instrument(skip_all, fields(topic = topic.name(), protocol = protocol, raw_delivery = raw_delivery))]
    pub async fn subscribe(
        &self,
        topic: &ResourceContext,
        endpoint: &SubscriptionEndpoint,
        protocol: &str,
        raw_delivery: bool,
    ) -> Result<Subscription> {
        let topic_path = topic.require_resolved()?;
        let address = match endpoint {
            SubscriptionEndpoint::Queue(queue) => {
                let queue_arn =
                    self.queues.arn(queue).await?.found().ok_or_else(|| missing_queue(queue))?;
                if raw_delivery {
                    self.allow_topic_delivery(queue, &queue_arn, topic_path).await?;
                }
                queue_arn
            }
            SubscriptionEndpoint::Address(address) => address.clone(),
        };

        let action = Action::Subscribe;
        let params = Params::new().with("Protocol", protocol).with("Endpoint", address.as_str());
        let subscription_id = self
            .dispatcher
            .call_found(&self.cancel, action, topic, &params, |tree| {
                RequestExecutor::require(tree, action, "SubscriptionArn")
            })
            .await?;

        if raw_delivery {
            self.enable_raw_delivery(topic, &subscription_id).await?;
        }

        info!(subscription = %subscription_id, "subscribed");
        Ok(Subscription { subscription_id, protocol: protocol.to_string(), endpoint: address, raw_delivery })
    }

    async fn allow_topic_delivery(
        &self,
        queue: &ResourceContext,
        queue_arn: &str,
        topic_path: &str,
    ) -> Result<()> {
        let attributes =
            self.queues.get_attributes(queue).await?.found().ok_or_else(|| missing_queue(queue))?;
        let sid = self.dispatcher.executor().digest(&format!("{topic_path}{queue_arn}"));

        match grant_topic_delivery(attributes.get(ATTR_POLICY).map(String::as_str), &sid, queue_arn, topic_path)? {
            Some(policy) => {
                let update = BTreeMap::from([(ATTR_POLICY.to_string(), policy)]);
                self.queues.set_attributes(queue, &update).await
            }
            None => {
                debug!(queue = queue.name(), "topic already allowed to deliver");
                Ok(())
            }
        }
    }

    async fn enable_raw_delivery(&self, topic: &ResourceContext, subscription_id: &str) -> Result<()> {
        let params = Params::new()
            .with("SubscriptionArn", subscription_id)
            .with("AttributeName", ATTR_RAW_MESSAGE_DELIVERY)
            .with("AttributeValue", "true");

        self.dispatcher
            .call_found(&self.cancel, Action::SetSubscriptionAttributes, topic, &params, |_| Ok(()))
            .await
    }
}

fn missing_queue(queue: &ResourceContext) -> CourierError {
    CourierError::InvalidInput(format!("subscription queue '{}' does not exist", queue.name()))
}

/// First `SUBJECT_MAX_CHARS` characters of `subject`
pub fn truncate_subject(subject: &str) -> String {
    subject.chars().take(SUBJECT_MAX_CHARS).collect()
}
