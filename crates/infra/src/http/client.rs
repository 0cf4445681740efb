use std::time::Duration;

use async_trait::async_trait;
use courier_core::{HttpInvoker, Params, RawResponse};
use courier_domain::constants::{DEFAULT_HTTP_TIMEOUT_SECONDS, DEFAULT_USER_AGENT};
use courier_domain::{CourierError, HttpConfig, ResourceContext, ResourceKind, Result};
use reqwest::Client as ReqwestClient;
use tracing::debug;
use url::Url;

use crate::decoding::parse_service_error;
use crate::errors::InfraError;

/// Response header carrying the full service error code, e.g.
/// `AWS.SimpleQueueService.NonExistentQueue;Sender`
pub const QUERY_ERROR_HEADER: &str = "x-amzn-query-error";

/// Form field naming the target topic of topic-scoped calls
pub const TOPIC_PATH_FIELD: &str = "TopicPath";

/// HTTP adapter issuing one form-encoded POST per call.
///
/// Queue calls are posted to the queue's own URL (the resource path joined
/// onto the endpoint when it is relative). Topic calls are posted to the
/// endpoint root with the resource path in a `TopicPath` field. Retrying is
/// left to the dispatcher; this client makes exactly one attempt.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Client honouring the timeout and user agent of `config`.
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::builder().timeout(config.timeout()).user_agent(config.user_agent.clone()).build()
    }

    fn form(action: &str, context: &ResourceContext, params: &Params) -> Vec<(String, String)> {
        let mut form = Vec::with_capacity(params.len() + 2);
        form.push(("Action".to_string(), action.to_string()));
        if context.kind() == ResourceKind::Topic
            && context.is_resolved()
            && params.get(TOPIC_PATH_FIELD).is_none()
        {
            form.push((TOPIC_PATH_FIELD.to_string(), context.resource_path().to_string()));
        }
        form.extend(params.iter().map(|(key, value)| (key.to_string(), value.to_string())));
        form
    }
}

/// Target URL for a call on `context`.
///
/// # Errors
/// Returns `CourierError::Config` when the endpoint or the resource path
/// does not form a valid URL.
pub fn target_url(context: &ResourceContext) -> Result<Url> {
    let endpoint = Url::parse(context.endpoint()).map_err(|e| {
        CourierError::Config(format!("invalid endpoint '{}': {e}", context.endpoint()))
    })?;

    let path = context.resource_path();
    if context.kind() == ResourceKind::Topic || path.is_empty() {
        return Ok(endpoint);
    }

    // A resolved queue path is either a full queue URL or a path on the endpoint.
    if let Ok(absolute) = Url::parse(path) {
        return Ok(absolute);
    }
    endpoint
        .join(path)
        .map_err(|e| CourierError::Config(format!("invalid resource path '{path}': {e}")))
}

#[async_trait]
impl HttpInvoker for HttpClient {
    async fn invoke(
        &self,
        action: &str,
        context: &ResourceContext,
        params: &Params,
    ) -> Result<RawResponse> {
        let url = target_url(context)?;
        let form = Self::form(action, context, params);
        debug!(action, %url, region = context.region(), fields = form.len(), "sending request");

        let response =
            self.client.post(url.clone()).form(&form).send().await.map_err(InfraError::from)?;

        let status = response.status();
        let code_hint = response
            .headers()
            .get(QUERY_ERROR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(InfraError::from)?;
        debug!(action, %url, %status, bytes = body.len(), "received response");

        if status.is_success() {
            return Ok(RawResponse { status: status.as_u16(), body: body.to_vec() });
        }

        let error = parse_service_error(status.as_u16(), code_hint.as_deref(), &body);
        debug!(action, code = error.code(), status = error.status(), "service rejected request");
        Err(CourierError::Service(error))
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            CourierError::from(infra)
        })?;

        Ok(HttpClient { client })
    }
}
