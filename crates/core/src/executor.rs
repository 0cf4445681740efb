//! Request executor
//!
//! One logical API action: invoke the HTTP collaborator, decode the body,
//! pull the designated result field, and check message integrity.

use std::collections::BTreeMap;
use std::sync::Arc;

use courier_common::Lookup;
use courier_domain::{CourierError, DigestAlgorithm, ResourceContext, ResponseNode, Result};
use tracing::{debug, instrument, warn};

use crate::action::Action;
use crate::params::Params;
use crate::ports::{Digester, HttpInvoker, ResponseDecoder};

/// Composes invoker, decoder and digester for single calls
#[derive(Clone)]
pub struct RequestExecutor {
    invoker: Arc<dyn HttpInvoker>,
    decoder: Arc<dyn ResponseDecoder>,
    digester: Arc<dyn Digester>,
    algorithm: DigestAlgorithm,
}

impl RequestExecutor {
    /// Create a new executor using the default digest algorithm
    pub fn new(
        invoker: Arc<dyn HttpInvoker>,
        decoder: Arc<dyn ResponseDecoder>,
        digester: Arc<dyn Digester>,
    ) -> Self {
        Self { invoker, decoder, digester, algorithm: DigestAlgorithm::default() }
    }

    /// Select the algorithm used for body checksums
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Perform one call and decode its response
    ///
    /// # Errors
    ///
    /// - `CourierError::Unresolved` if a resource-scoped action is given a
    ///   context without a resource path (nothing is sent)
    /// - whatever the invoker or decoder report
    #[instrument(skip_all, fields(action = %action, resource = context.name()))]
    pub async fn execute(
        &self,
        action: Action,
        context: &ResourceContext,
        params: &Params,
    ) -> Result<ResponseNode> {
        if action.is_resource_scoped() {
            context.require_resolved()?;
        }

        let response = self.invoker.invoke(action.name(), context, params).await?;
        debug!(status = response.status, bytes = response.body.len(), "response received");

        self.decoder.decode(&response.body)
    }

    /// Pull `field` from the action's result node
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Decode` when the field is missing and the
    /// action does not permit absence.
    pub fn extract(tree: &ResponseNode, action: Action, field: &str) -> Result<Lookup<String>> {
        let result_key = action.result_key();
        Self::extract_path(tree, action, &[result_key.as_str(), field])
    }

    /// Pull the text value at an explicit path
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Decode` when the value is missing and the
    /// action does not permit absence.
    pub fn extract_path(tree: &ResponseNode, action: Action, path: &[&str]) -> Result<Lookup<String>> {
        match tree.extract(path) {
            Some(value) => Ok(Lookup::Found(value.to_string())),
            None if action.permits_absence() => Ok(Lookup::Absent),
            None => Err(CourierError::Decode(format!(
                "{action} response is missing {}",
                path.join(".")
            ))),
        }
    }

    /// Pull `field` from the action's result node, absence not allowed
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Decode` when the field is missing.
    pub fn require(tree: &ResponseNode, action: Action, field: &str) -> Result<String> {
        tree.extract(&[action.result_key().as_str(), field])
            .map(str::to_string)
            .ok_or_else(|| {
                CourierError::Decode(format!("{action} response is missing {}.{field}", action.result_key()))
            })
    }

    /// Attribute map of the action's result
    ///
    /// Accepts both the indexed form (`Attribute: [{Name, Value}, ...]`) and a
    /// plain `Attributes` object.
    pub fn attributes(tree: &ResponseNode, action: Action) -> BTreeMap<String, String> {
        let result_key = action.result_key();
        let mut attributes = tree
            .at(&[result_key.as_str(), "Attributes"])
            .map(ResponseNode::text_entries)
            .unwrap_or_default();

        for entry in tree.children(&[result_key.as_str(), "Attribute"]) {
            if let (Some(name), Some(value)) = (entry.extract(&["Name"]), entry.extract(&["Value"])) {
                attributes.insert(name.to_string(), value.to_string());
            }
        }
        attributes
    }

    /// Checksum of a message body
    pub fn digest(&self, body: &str) -> String {
        self.digester.digest(self.algorithm, body.as_bytes())
    }

    /// Compare the body checksum with the one reported by the service
    ///
    /// Returns the locally computed checksum.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Integrity` on mismatch. Integrity failures are
    /// never retried.
    pub fn verify(&self, body: &str, expected: &str) -> Result<String> {
        let actual = self.digest(body);
        if actual.eq_ignore_ascii_case(expected.trim()) {
            Ok(actual)
        } else {
            warn!(expected, actual = %actual, "message checksum mismatch");
            Err(CourierError::Integrity { expected: expected.to_string(), actual })
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor").field("algorithm", &self.algorithm).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use courier_domain::{ResourceKind, ServiceError};

    use super::*;
    use crate::ports::RawResponse;

    struct EchoInvoker {
        calls: Mutex<Vec<String>>,
        outcome: Result<RawResponse>,
    }

    #[async_trait]
    impl HttpInvoker for EchoInvoker {
        async fn invoke(&self, action: &str, _: &ResourceContext, _: &Params) -> Result<RawResponse> {
            self.calls.lock().unwrap().push(action.to_string());
            self.outcome.clone()
        }
    }

    struct FixedDecoder;

    impl ResponseDecoder for FixedDecoder {
        fn decode(&self, body: &[u8]) -> Result<ResponseNode> {
            let text = String::from_utf8_lossy(body).to_string();
            Ok(ResponseNode::from_iter([(
                "SendMessageResult",
                ResponseNode::from_iter([("MessageId", ResponseNode::from(text))]),
            )]))
        }
    }

    struct LengthDigester;

    impl Digester for LengthDigester {
        fn digest(&self, _: DigestAlgorithm, bytes: &[u8]) -> String {
            format!("{:x}", bytes.len())
        }
    }

    fn executor(outcome: Result<RawResponse>) -> (RequestExecutor, Arc<EchoInvoker>) {
        let invoker = Arc::new(EchoInvoker { calls: Mutex::new(Vec::new()), outcome });
        let executor =
            RequestExecutor::new(invoker.clone(), Arc::new(FixedDecoder), Arc::new(LengthDigester));
        (executor, invoker)
    }

    fn resolved_queue() -> ResourceContext {
        ResourceContext::new(ResourceKind::Queue, "jobs", "http://localhost").resolved("/1/jobs")
    }

    #[tokio::test]
    async fn execute_decodes_body() {
        let (executor, invoker) = executor(Ok(RawResponse::ok("id-1")));

        let tree = executor
            .execute(Action::SendMessage, &resolved_queue(), &Params::new())
            .await
            .expect("call should succeed");

        assert_eq!(
            RequestExecutor::extract(&tree, Action::SendMessage, "MessageId").unwrap(),
            Lookup::Found("id-1".to_string())
        );
        assert_eq!(*invoker.calls.lock().unwrap(), vec!["SendMessage".to_string()]);
    }

    #[tokio::test]
    async fn unresolved_context_is_rejected_before_sending() {
        let (executor, invoker) = executor(Ok(RawResponse::ok("id-1")));
        let unresolved = ResourceContext::new(ResourceKind::Queue, "jobs", "http://localhost");

        let err = executor
            .execute(Action::ReceiveMessage, &unresolved, &Params::new())
            .await
            .unwrap_err();

        assert_eq!(err, CourierError::Unresolved("jobs".into()));
        assert!(invoker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn service_errors_pass_through_verbatim() {
        let service = ServiceError::new("AWS.SimpleQueueService.NonExistentQueue", "gone", 400);
        let (executor, _) = executor(Err(CourierError::Service(service.clone())));

        let err = executor
            .execute(Action::DeleteQueue, &resolved_queue(), &Params::new())
            .await
            .unwrap_err();

        assert_eq!(err, CourierError::Service(service));
    }

    #[test]
    fn missing_field_is_absent_only_when_permitted() {
        let tree = ResponseNode::empty();

        assert_eq!(
            RequestExecutor::extract(&tree, Action::ReceiveMessage, "Message").unwrap(),
            Lookup::Absent
        );
        assert!(matches!(
            RequestExecutor::extract(&tree, Action::CreateQueue, "QueueUrl"),
            Err(CourierError::Decode(msg)) if msg.contains("CreateQueueResult.QueueUrl")
        ));
    }

    #[test]
    fn attributes_accept_indexed_and_plain_forms() {
        let indexed = ResponseNode::from_iter([(
            "GetQueueAttributesResult",
            ResponseNode::from_iter([(
                "Attribute",
                ResponseNode::List(vec![
                    ResponseNode::from_iter([
                        ("Name", ResponseNode::from("ApproximateNumberOfMessages")),
                        ("Value", ResponseNode::from("4")),
                    ]),
                    ResponseNode::from_iter([
                        ("Name", ResponseNode::from("QueueArn")),
                        ("Value", ResponseNode::from("arn:queue:jobs")),
                    ]),
                ]),
            )]),
        )]);
        let plain = ResponseNode::from_iter([(
            "GetTopicAttributesResult",
            ResponseNode::from_iter([(
                "Attributes",
                ResponseNode::from_iter([("TopicArn", ResponseNode::from("arn:topic:events"))]),
            )]),
        )]);

        let queue = RequestExecutor::attributes(&indexed, Action::GetQueueAttributes);
        let topic = RequestExecutor::attributes(&plain, Action::GetTopicAttributes);

        assert_eq!(queue.get("ApproximateNumberOfMessages").map(String::as_str), Some("4"));
        assert_eq!(queue.len(), 2);
        assert_eq!(topic.get("TopicArn").map(String::as_str), Some("arn:topic:events"));
    }

    #[test]
    fn require_reports_missing_path() {
        let err = RequestExecutor::require(&ResponseNode::empty(), Action::Publish, "MessageId").unwrap_err();
        assert_eq!(err, CourierError::Decode("Publish response is missing PublishResult.MessageId".into()));
    }

    #[test]
    fn verify_detects_mismatch() {
        let (executor, _) = executor(Ok(RawResponse::ok("")));

        assert_eq!(executor.verify("hello", "5"), Ok("5".to_string()));
        assert_eq!(
            executor.verify("hello!", "5"),
            Err(CourierError::Integrity { expected: "5".into(), actual: "6".into() })
        );
    }
}
