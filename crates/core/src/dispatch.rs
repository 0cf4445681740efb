//! Retrying dispatch of service actions
//!
//! A [`Dispatcher`] owns the request executor, the error classifier and the
//! retry controller, and runs each action as a unit of work under the retry
//! policy. Services share one dispatcher through an `Arc` and pass their own
//! cancellation token with every call, so abandoning one operation never
//! affects another.

use std::future::Future;

use courier_common::{Clock, Lookup, RetryController, RetryError, RetryPolicy, RetryVerdict, SystemClock};
use courier_domain::{ClientConfig, CourierError, ResourceContext, ResponseNode, Result};
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::classification::ServiceErrorClassifier;
use crate::executor::RequestExecutor;
use crate::params::Params;

/// Runs actions with classification and retries
#[derive(Debug)]
pub struct Dispatcher<C: Clock = SystemClock> {
    executor: RequestExecutor,
    classifier: ServiceErrorClassifier,
    controller: RetryController<C>,
}

impl Dispatcher<SystemClock> {
    /// Create a dispatcher backed by the real clock
    pub fn new(executor: RequestExecutor, classifier: ServiceErrorClassifier, policy: RetryPolicy) -> Self {
        Self::with_clock(executor, classifier, policy, SystemClock)
    }

    /// Dispatcher configured from the client configuration
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Config` when the retry settings are invalid.
    pub fn from_config(executor: RequestExecutor, config: &ClientConfig) -> Result<Self> {
        let policy = RetryPolicy::new(config.retry.max_attempts, config.retry.cooldown())
            .map_err(|err| CourierError::Config(err.to_string()))?;
        Ok(Self::new(
            executor.with_algorithm(config.digest),
            ServiceErrorClassifier::from_config(&config.retry),
            policy,
        ))
    }
}

impl<C: Clock> Dispatcher<C> {
    /// Create a dispatcher with a custom clock
    ///
    /// The policy delay is the wait applied to cooldown errors; it replaces
    /// whatever cooldown `classifier` carried.
    pub fn with_clock(
        executor: RequestExecutor,
        classifier: ServiceErrorClassifier,
        policy: RetryPolicy,
        clock: C,
    ) -> Self {
        Self {
            executor,
            classifier: classifier.with_cooldown(policy.delay),
            controller: RetryController::with_clock(policy, clock),
        }
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn classifier(&self) -> &ServiceErrorClassifier {
        &self.classifier
    }

    pub fn controller(&self) -> &RetryController<C> {
        &self.controller
    }

    /// Run a unit of work for `action` under the retry policy
    ///
    /// # Errors
    ///
    /// - the unit's error on a fatal verdict, unchanged
    /// - `CourierError::AttemptsExhausted` when the attempt budget runs out
    /// - `CourierError::Cancelled` when `cancel` fires
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, action: Action, unit: F) -> Result<Lookup<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RetryVerdict<T, CourierError>>,
    {
        self.controller
            .run(cancel, action.name(), unit)
            .await
            .map_err(|error| surface(action, error))
    }

    /// Execute `action` and decode its response, retrying per classification
    ///
    /// `decode` runs on every successful response; its errors are
    /// classified like call failures.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::run`].
    pub async fn call<T, D>(
        &self,
        cancel: &CancellationToken,
        action: Action,
        context: &ResourceContext,
        params: &Params,
        decode: D,
    ) -> Result<Lookup<T>>
    where
        D: Fn(&ResponseNode) -> Result<Lookup<T>>,
    {
        let decode = &decode;
        self.run(cancel, action, move || async move {
            let decoded = self
                .executor
                .execute(action, context, params)
                .await
                .and_then(|tree| decode(&tree));
            match decoded {
                Ok(Lookup::Found(value)) => RetryVerdict::Succeed(value),
                Ok(Lookup::Absent) => RetryVerdict::Absent,
                Err(error) => self.classifier.verdict(action.operation(), error),
            }
        })
        .await
    }

    /// Like [`Dispatcher::call`] for actions that always produce a value
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::run`]; an absent result is a `CourierError::Decode`.
    pub async fn call_found<T, D>(
        &self,
        cancel: &CancellationToken,
        action: Action,
        context: &ResourceContext,
        params: &Params,
        decode: D,
    ) -> Result<T>
    where
        D: Fn(&ResponseNode) -> Result<T>,
    {
        let lookup =
            self.call(cancel, action, context, params, |tree| decode(tree).map(Lookup::Found)).await?;
        require_found(action, lookup)
    }
}

/// Unwrap a lookup for an action that cannot be absent
///
/// # Errors
///
/// Returns `CourierError::Decode` for `Lookup::Absent`.
pub fn require_found<T>(action: Action, lookup: Lookup<T>) -> Result<T> {
    lookup.found().ok_or_else(|| CourierError::Decode(format!("{action} returned no result")))
}

fn surface(action: Action, error: RetryError<CourierError>) -> CourierError {
    match error {
        RetryError::Fatal(error) => error,
        RetryError::AttemptsExhausted { attempts } => {
            CourierError::AttemptsExhausted { action: action.name().to_string(), attempts }
        }
        RetryError::Cancelled { attempts } => {
            CourierError::Cancelled { action: action.name().to_string(), attempts }
        }
        RetryError::InvalidConfiguration { message } => CourierError::Config(message),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use courier_domain::{DigestAlgorithm, RetryConfig};

    use super::*;
    use crate::ports::{Digester, HttpInvoker, RawResponse, ResponseDecoder};

    struct Unreachable;

    #[async_trait]
    impl HttpInvoker for Unreachable {
        async fn invoke(&self, action: &str, _: &ResourceContext, _: &Params) -> Result<RawResponse> {
            Err(CourierError::Internal(format!("{action} not expected")))
        }
    }

    impl ResponseDecoder for Unreachable {
        fn decode(&self, _: &[u8]) -> Result<ResponseNode> {
            Ok(ResponseNode::empty())
        }
    }

    impl Digester for Unreachable {
        fn digest(&self, _: DigestAlgorithm, _: &[u8]) -> String {
            String::new()
        }
    }

    fn executor() -> RequestExecutor {
        RequestExecutor::new(Arc::new(Unreachable), Arc::new(Unreachable), Arc::new(Unreachable))
    }

    #[test]
    fn zero_attempt_budget_is_a_config_error() {
        let config = ClientConfig {
            retry: RetryConfig { max_attempts: 0, ..RetryConfig::default() },
            ..ClientConfig::default()
        };

        let err = Dispatcher::from_config(executor(), &config).unwrap_err();

        assert_eq!(
            err,
            CourierError::Config("invalid retry configuration: max_attempts must be greater than 0".into())
        );
    }

    #[test]
    fn policy_delay_sets_the_cooldown() {
        let policy = RetryPolicy::new(5, Duration::from_secs(5)).unwrap();

        let dispatcher = Dispatcher::new(executor(), ServiceErrorClassifier::default(), policy);

        assert_eq!(dispatcher.classifier().cooldown(), Duration::from_secs(5));
        assert_eq!(dispatcher.controller().policy().delay, Duration::from_secs(5));
    }

    #[test]
    fn retry_errors_keep_their_identity() {
        assert_eq!(
            surface(Action::CreateQueue, RetryError::AttemptsExhausted { attempts: 5 }),
            CourierError::AttemptsExhausted { action: "CreateQueue".into(), attempts: 5 }
        );
        assert_eq!(
            surface(Action::ReceiveMessage, RetryError::Cancelled { attempts: 1 }),
            CourierError::Cancelled { action: "ReceiveMessage".into(), attempts: 1 }
        );
        let fatal = CourierError::Decode("bad".into());
        assert_eq!(surface(Action::SendMessage, RetryError::Fatal(fatal.clone())), fatal);
    }

    #[test]
    fn absent_where_a_value_is_required_is_a_decode_error() {
        assert_eq!(require_found(Action::SendMessage, Lookup::Found(3)), Ok(3));
        assert!(matches!(
            require_found::<u8>(Action::SendMessage, Lookup::Absent),
            Err(CourierError::Decode(_))
        ));
    }
}
