//! Scripted collaborators for service tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use courier_core::{Digester, HttpInvoker, Params, RawResponse, ResponseDecoder};
use courier_domain::{
    CourierError, DigestAlgorithm, ResourceContext, ResponseNode, Result as DomainResult,
    ServiceError,
};
use serde_json::Value;

/// One call observed by [`ScriptedInvoker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub action: String,
    pub resource_path: String,
    pub params: Params,
}

#[derive(Default)]
struct Script {
    queued: VecDeque<DomainResult<RawResponse>>,
    fallback: Option<DomainResult<RawResponse>>,
}

/// Invoker answering each action from a per-action script
///
/// Queued responses are consumed in order; once exhausted the action's
/// fallback (if any) answers every further call. Unscripted calls fail with
/// `CourierError::Internal` so a test notices unexpected traffic.
#[derive(Default)]
pub struct ScriptedInvoker {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON body for the next call of `action`
    pub fn respond(&self, action: &str, body: Value) -> &Self {
        self.push(action, Ok(RawResponse::ok(body.to_string())))
    }

    /// Queue a service error for the next call of `action`
    pub fn fail(&self, action: &str, code: &str, message: &str) -> &Self {
        self.push(action, Err(CourierError::Service(ServiceError::new(code, message, 400))))
    }

    /// Queue an arbitrary outcome for the next call of `action`
    pub fn push(&self, action: &str, outcome: DomainResult<RawResponse>) -> &Self {
        self.scripts.lock().unwrap().entry(action.to_string()).or_default().queued.push_back(outcome);
        self
    }

    /// Answer every call of `action` with `body` once its queue is empty
    pub fn respond_always(&self, action: &str, body: Value) -> &Self {
        self.always(action, Ok(RawResponse::ok(body.to_string())))
    }

    /// Fail every call of `action` once its queue is empty
    pub fn fail_always(&self, action: &str, code: &str, message: &str) -> &Self {
        self.always(action, Err(CourierError::Service(ServiceError::new(code, message, 400))))
    }

    fn always(&self, action: &str, outcome: DomainResult<RawResponse>) -> &Self {
        self.scripts.lock().unwrap().entry(action.to_string()).or_default().fallback = Some(outcome);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Actions in call order
    pub fn actions(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.action).collect()
    }

    pub fn count(&self, action: &str) -> usize {
        self.calls().iter().filter(|call| call.action == action).count()
    }

    /// First call of `action`
    ///
    /// Panics when `action` was never called.
    pub fn call_of(&self, action: &str) -> RecordedCall {
        self.calls_of(action).into_iter().next().unwrap_or_else(|| panic!("{action} was never called"))
    }

    /// Calls of `action` in order
    pub fn calls_of(&self, action: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|call| call.action == action).collect()
    }
}

#[async_trait]
impl HttpInvoker for ScriptedInvoker {
    async fn invoke(
        &self,
        action: &str,
        context: &ResourceContext,
        params: &Params,
    ) -> DomainResult<RawResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            action: action.to_string(),
            resource_path: context.resource_path().to_string(),
            params: params.clone(),
        });

        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(action)
            .ok_or_else(|| CourierError::Internal(format!("unscripted action {action}")))?;
        match script.queued.pop_front() {
            Some(outcome) => outcome,
            None => script
                .fallback
                .clone()
                .unwrap_or_else(|| Err(CourierError::Internal(format!("script for {action} exhausted")))),
        }
    }
}

/// Decodes JSON bodies straight into a response tree
pub struct JsonTreeDecoder;

impl ResponseDecoder for JsonTreeDecoder {
    fn decode(&self, body: &[u8]) -> DomainResult<ResponseNode> {
        if body.is_empty() {
            return Ok(ResponseNode::empty());
        }
        Ok(serde_json::from_slice(body)?)
    }
}

/// Deterministic FNV-1a checksum, good enough to tell bodies apart
pub struct ChecksumDigester;

impl Digester for ChecksumDigester {
    fn digest(&self, _algorithm: DigestAlgorithm, bytes: &[u8]) -> String {
        checksum_bytes(bytes)
    }
}

/// Checksum the fakes compute for `body`
pub fn checksum(body: &str) -> String {
    checksum_bytes(body.as_bytes())
}

fn checksum_bytes(bytes: &[u8]) -> String {
    let hash = bytes.iter().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0100_0000_01b3)
    });
    format!("{hash:016x}")
}
