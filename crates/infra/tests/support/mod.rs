//! Shared helpers for infra integration tests
#![allow(dead_code)]

use courier_core::Digester;
use courier_domain::{ClientConfig, DigestAlgorithm, RetryConfig};
use courier_infra::{CourierClient, HashDigester};
use serde_json::Value;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCOUNT_PATH: &str = "/000000000000";

/// Client configuration pointing at `server` with instant retries
pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        endpoint: server.uri(),
        account: Some("000000000000".into()),
        retry: RetryConfig { max_attempts: 3, cooldown_seconds: 0, ..RetryConfig::default() },
        ..ClientConfig::default()
    }
}

pub fn client(server: &MockServer) -> CourierClient {
    CourierClient::from_config(config(server)).expect("client")
}

/// Queue URL the mock service hands out for `name`
pub fn queue_url(server: &MockServer, name: &str) -> String {
    format!("{}{ACCOUNT_PATH}/{name}", server.uri())
}

pub fn sha256(body: &str) -> String {
    HashDigester.digest(DigestAlgorithm::Sha256, body.as_bytes())
}

/// Mock answering `action` posted to `url_path`
pub fn action(action: &str, url_path: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST")).and(path(url_path)).and(body_string_contains(format!("Action={action}")))
}

pub fn json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Error response in the service's JSON protocol
pub fn service_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("x-amzn-query-error", format!("{code};Sender"))
        .set_body_json(serde_json::json!({ "__type": code, "message": message }))
}
