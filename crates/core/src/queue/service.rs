//! Queue service - queue lifecycle and message operations

use std::collections::BTreeMap;
use std::sync::Arc;

use courier_common::{Clock, Lookup, RetryVerdict, SystemClock};
use courier_domain::constants::{
    ATTR_APPROXIMATE_MESSAGES, ATTR_APPROXIMATE_NOT_VISIBLE, ATTR_QUEUE_ARN, MAX_BATCH_ENTRIES,
};
use courier_domain::{
    BatchConfirmation, CourierError, Message, ReceiveOptions, ResourceContext, ResponseNode,
    Result, SendConfirmation, ServiceError,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::action::Action;
use crate::dispatch::{require_found, Dispatcher};
use crate::executor::RequestExecutor;
use crate::params::Params;

const BATCH_ENTRY_PREFIX: &str = "SendMessageBatchRequestEntry";
const BODY_CHECKSUM: &str = "BodyChecksum";

/// Queue operations
///
/// Every operation runs under the service's cancellation token. Use
/// [`QueueService::with_cancellation`] to scope a copy to one caller.
pub struct QueueService<C: Clock = SystemClock> {
    dispatcher: Arc<Dispatcher<C>>,
    cancel: CancellationToken,
}

impl<C: Clock> Clone for QueueService<C> {
    fn clone(&self) -> Self {
        Self { dispatcher: self.dispatcher.clone(), cancel: self.cancel.clone() }
    }
}

impl<C: Clock> QueueService<C> {
    /// Create a new queue service
    pub fn new(dispatcher: Arc<Dispatcher<C>>) -> Self {
        Self { dispatcher, cancel: CancellationToken::new() }
    }

    /// Copy of this service whose operations stop when `token` is cancelled
    ///
    /// Other copies keep their own token and are not affected.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self { dispatcher: self.dispatcher.clone(), cancel: token }
    }

    pub fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Look up the queue named by `context`
    ///
    /// Returns a resolved copy of `context`, or `Absent` when no such queue
    /// exists.
    #[instrument(skip_all, fields(queue = context.name()))]
    pub async fn resolve(&self, context: &ResourceContext) -> Result<Lookup<ResourceContext>> {
        let action = Action::GetQueueUrl;
        let params = Params::new().with("QueueName", context.name());

        self.dispatcher
            .call(&self.cancel, action, context, &params, |tree| {
                RequestExecutor::extract(tree, action, "QueueUrl")?
                    .map(|url| context.resolve_to(url))
                    .transpose()
            })
            .await
    }

    /// Create the queue named by `context`
    ///
    /// A conflicting queue of the same name is deleted once and creation is
    /// retried. A recently deleted name is retried after the cooldown.
    ///
    /// # Errors
    ///
    /// Any fatal service error, or `AttemptsExhausted` when conflicts or
    /// cooldowns outlast the attempt budget.
    #[instrument(skip_all, fields(queue = context.name()))]
    pub async fn create(
        &self,
        context: &ResourceContext,
        options: &BTreeMap<String, String>,
    ) -> Result<ResourceContext> {
        let action = Action::CreateQueue;
        let mut params = Params::new().with("QueueName", context.name());
        params.push_attributes(options.iter().map(|(name, value)| (name.clone(), value.clone())));

        let dispatcher = self.dispatcher.as_ref();
        let params = &params;
        let lookup = dispatcher
            .run(&self.cancel, action, move || async move {
                let created = dispatcher
                    .executor()
                    .execute(action, context, params)
                    .await
                    .and_then(|tree| RequestExecutor::require(&tree, action, "QueueUrl"))
                    .and_then(|url| context.resolve_to(url));
                match created {
                    Ok(resolved) => RetryVerdict::Succeed(resolved),
                    Err(error) => {
                        dispatcher
                            .classifier()
                            .verdict_with_remediation(action.operation(), error, || {
                                self.remove_conflicting(context)
                            })
                            .await
                    }
                }
            })
            .await?;

        let created = require_found(action, lookup)?;
        info!(path = created.resource_path(), "queue created");
        Ok(created)
    }

    /// Delete the queue
    ///
    /// An unresolved context is looked up first. A queue that does not exist
    /// (before or during the call) yields `Absent`.
    #[instrument(skip_all, fields(queue = context.name()))]
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
            .call(&self.cancel, Action::DeleteQueue, &target, &Params::new(), |_| Ok(Lookup::Found(())))
            .await
    }

    async fn remove_conflicting(&self, context: &ResourceContext) -> Result<()> {
        info!(queue = context.name(), "deleting conflicting queue");
        self.delete(context).await.map(|_| ())
    }

    /// Send one message
    ///
    /// The confirmation echoes the locally computed body checksum. When the
    /// service reports its own checksum the two must match.
    #[instrument(skip_all, fields(queue = context.name()))]
    pub async fn send(&self, context: &ResourceContext, body: &str) -> Result<SendConfirmation> {
        let action = Action::SendMessage;
        let executor = self.dispatcher.executor();
        let checksum = executor.digest(body);
        let params = Params::new().with("MessageBody", body);

        self.dispatcher
            .call_found(&self.cancel, action, context, &params, |tree| {
                let message_id = RequestExecutor::require(tree, action, "MessageId")?;
                if let Some(reported) = tree.extract(&[action.result_key().as_str(), BODY_CHECKSUM]) {
                    executor.verify(body, reported)?;
                }
                Ok(SendConfirmation { message_id, checksum: checksum.clone() })
            })
            .await
    }

    /// Send several messages, one outcome per body in input order
    ///
    /// Bodies are sent in chunks of at most the service batch limit. Entry
    /// ids count from 1 across the whole input. An entry the service rejects
    /// carries its service error; a chunk whose call fails carries that
    /// error on each of its entries. Later chunks are still sent, so every
    /// `Ok` entry was accepted by the service.
    ///
    /// # Errors
    ///
    /// `CourierError::Unresolved` when `context` has no resource path.
    #[instrument(skip_all, fields(queue = context.name(), count = bodies.len()))]
    pub async fn send_batch<B: AsRef<str>>(
        &self,
        context: &ResourceContext,
        bodies: &[B],
    ) -> Result<Vec<Result<BatchConfirmation>>> {
        context.require_resolved()?;

        let mut outcomes = Vec::with_capacity(bodies.len());
        for (chunk_index, chunk) in bodies.chunks(MAX_BATCH_ENTRIES).enumerate() {
            let first_id = chunk_index * MAX_BATCH_ENTRIES + 1;
            let entries: Vec<(String, &str)> = chunk
                .iter()
                .enumerate()
                .map(|(offset, body)| ((first_id + offset).to_string(), body.as_ref()))
                .collect();
            match self.send_chunk(context, &entries).await {
                Ok(chunk_outcomes) => outcomes.extend(chunk_outcomes),
                Err(error) => {
                    warn!(first_id, entries = entries.len(), error = %error, "batch chunk failed");
                    outcomes.extend(entries.iter().map(|_| Err(error.clone())));
                }
            }
        }
        Ok(outcomes)
    }

    async fn send_chunk(
        &self,
        context: &ResourceContext,
        entries: &[(String, &str)],
    ) -> Result<Vec<Result<BatchConfirmation>>> {
        let action = Action::SendMessageBatch;
        let executor = self.dispatcher.executor();
        let mut params = Params::new();
        params.push_entries(
            BATCH_ENTRY_PREFIX,
            entries.iter().map(|(id, body)| [("Id", id.clone()), ("MessageBody", (*body).to_string())]),
        );

        self.dispatcher
            .call_found(&self.cancel, action, context, &params, |tree| {
                Ok(decode_batch(executor, tree, entries))
            })
            .await
    }

    /// Receive at most one message
    ///
    /// `Absent` when the queue currently has nothing to deliver.
    pub async fn receive(&self, context: &ResourceContext) -> Result<Lookup<Message>> {
        self.receive_with(context, ReceiveOptions::default()).await
    }

    /// Receive at most one message with long polling / visibility options
    ///
    /// # Errors
    ///
    /// `CourierError::Integrity` when the body does not match the checksum
    /// the service reported. This is never retried.
    #[instrument(skip_all, fields(queue = context.name()))]
    pub async fn receive_with(
        &self,
        context: &ResourceContext,
        options: ReceiveOptions,
    ) -> Result<Lookup<Message>> {
        let action = Action::ReceiveMessage;
        let executor = self.dispatcher.executor();
        let mut params = Params::new().with("MaxNumberOfMessages", "1");
        params
            .push_opt("WaitTimeSeconds", options.wait_time_seconds)
            .push_opt("VisibilityTimeout", options.visibility_timeout);

        self.dispatcher
            .call(&self.cancel, action, context, &params, |tree| {
                let Some(node) = tree.children(&[action.result_key().as_str(), "Message"]).first() else {
                    return Ok(Lookup::Absent);
                };
                decode_message(executor, node).map(Lookup::Found)
            })
            .await
    }

    /// Acknowledge a received message
    ///
    /// # Errors
    ///
    /// `CourierError::InvalidInput` when the message carries no receipt
    /// handle.
    #[instrument(skip_all, fields(queue = context.name(), message_id = %message.message_id))]
    pub async fn delete_message(&self, context: &ResourceContext, message: &Message) -> Result<()> {
        let receipt_handle = message.receipt_handle.as_deref().ok_or_else(|| {
            CourierError::InvalidInput(format!("message {} has no receipt handle", message.message_id))
        })?;
        let params = Params::new().with("ReceiptHandle", receipt_handle);

        self.dispatcher.call_found(&self.cancel, Action::DeleteMessage, context, &params, |_| Ok(())).await
    }

    /// Receive and delete until the queue reports nothing to deliver
    ///
    /// Returns the number of messages deleted.
    #[instrument(skip_all, fields(queue = context.name()))]
    pub async fn drain(&self, context: &ResourceContext) -> Result<usize> {
        let mut deleted = 0;
        while let Lookup::Found(message) = self.receive(context).await? {
            self.delete_message(context, &message).await?;
            deleted += 1;
        }
        debug!(deleted, "queue drained");
        Ok(deleted)
    }

    /// All queue attributes, or `Absent` for a queue that no longer exists
    #[instrument(skip_all, fields(queue = context.name()))]
    pub async fn get_attributes(
        &self,
        context: &ResourceContext,
    ) -> Result<Lookup<BTreeMap<String, String>>> {
        let action = Action::GetQueueAttributes;
        let params = Params::new().with("AttributeName.1", "All");

        self.dispatcher
            .call(&self.cancel, action, context, &params, |tree| {
                Ok(Lookup::Found(RequestExecutor::attributes(tree, action)))
            })
            .await
    }

    /// Set queue attributes
    #[instrument(skip_all, fields(queue = context.name()))]
    pub async fn set_attributes(
        &self,
        context: &ResourceContext,
        attributes: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut params = Params::new();
        params.push_attributes(attributes.iter().map(|(name, value)| (name.clone(), value.clone())));

        self.dispatcher
            .call_found(&self.cancel, Action::SetQueueAttributes, context, &params, |_| Ok(()))
            .await
    }

    /// Approximate number of visible messages
    ///
    /// # Errors
    ///
    /// `CourierError::Decode` when the attribute is missing, not a number,
    /// or the queue does not exist.
    pub async fn count(&self, context: &ResourceContext) -> Result<u64> {
        self.numeric_attribute(context, ATTR_APPROXIMATE_MESSAGES).await
    }

    /// Approximate number of received but not yet deleted messages
    ///
    /// # Errors
    ///
    /// Same as [`QueueService::count`].
    pub async fn in_flight_count(&self, context: &ResourceContext) -> Result<u64> {
        self.numeric_attribute(context, ATTR_APPROXIMATE_NOT_VISIBLE).await
    }

    /// Service-wide identifier of the queue
    ///
    /// Falls back to the resource path when the service reports no
    /// identifier attribute. `Absent` when the queue no longer exists.
    pub async fn arn(&self, context: &ResourceContext) -> Result<Lookup<String>> {
        Ok(self.get_attributes(context).await?.map(|attributes| {
            attributes
                .get(ATTR_QUEUE_ARN)
                .cloned()
                .unwrap_or_else(|| context.resource_path().to_string())
        }))
    }

    async fn numeric_attribute(&self, context: &ResourceContext, key: &str) -> Result<u64> {
        let attributes = match self.get_attributes(context).await? {
            Lookup::Found(attributes) => attributes,
            Lookup::Absent => {
                return Err(CourierError::Decode(format!(
                    "queue '{}' does not exist, no {key} to read",
                    context.name()
                )))
            }
        };
        let raw = attributes
            .get(key)
            .ok_or_else(|| CourierError::Decode(format!("attribute {key} is missing")))?;
        raw.trim()
            .parse::<u64>()
            .map_err(|_| CourierError::Decode(format!("attribute {key} is not a number: '{raw}'")))
    }
}

fn decode_message(executor: &RequestExecutor, node: &ResponseNode) -> Result<Message> {
    let field = |name: &str| {
        node.extract(&[name])
            .map(str::to_string)
            .ok_or_else(|| CourierError::Decode(format!("received message is missing {name}")))
    };

    let body = field("Body")?;
    let checksum = field(BODY_CHECKSUM)?;
    executor.verify(&body, &checksum)?;

    Ok(Message {
        message_id: field("MessageId")?,
        body,
        receipt_handle: node.extract(&["ReceiptHandle"]).map(str::to_string),
        checksum,
    })
}

fn decode_batch(
    executor: &RequestExecutor,
    tree: &ResponseNode,
    entries: &[(String, &str)],
) -> Vec<Result<BatchConfirmation>> {
    let result_key = Action::SendMessageBatch.result_key();
    let failures = tree.children(&[result_key.as_str(), "BatchResultErrorEntry"]);
    let successes = tree.children(&[result_key.as_str(), "SendMessageBatchResultEntry"]);

    entries
        .iter()
        .map(|(id, body)| {
            if let Some(failure) = entry_with_id(failures, id) {
                return Err(CourierError::Service(ServiceError::new(
                    failure.extract(&["Code"]).unwrap_or("BatchEntryFailed"),
                    failure.extract(&["Message"]).unwrap_or_default(),
                    400,
                )));
            }
            let node = entry_with_id(successes, id)
                .ok_or_else(|| CourierError::Decode(format!("batch result has no entry {id}")))?;
            let message_id = node
                .extract(&["MessageId"])
                .ok_or_else(|| CourierError::Decode(format!("batch entry {id} is missing MessageId")))?;
            let checksum = match node.extract(&[BODY_CHECKSUM]) {
                Some(reported) => executor.verify(body, reported)?,
                None => executor.digest(body),
            };
            Ok(BatchConfirmation { entry_id: id.clone(), message_id: message_id.to_string(), checksum })
        })
        .collect()
}

fn entry_with_id<'a>(nodes: &'a [ResponseNode], id: &str) -> Option<&'a ResponseNode> {
    nodes.iter().find(|node| node.extract(&["Id"]) == Some(id))
}
