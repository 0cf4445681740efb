//! JSON response decoding
//!
//! Scalars are flattened to text so services read every field the same way:
//! numbers and booleans keep their JSON spelling and `null` members are
//! dropped.

use std::collections::BTreeMap;

use courier_core::ResponseDecoder;
use courier_domain::{CourierError, ResponseNode, Result, ServiceError};
use serde_json::{Map, Value};

/// Longest raw body echoed into an error message
const ERROR_BODY_PREVIEW: usize = 256;

/// [`ResponseDecoder`] for JSON bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ResponseDecoder for JsonDecoder {
    fn decode(&self, body: &[u8]) -> Result<ResponseNode> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ResponseNode::empty());
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| CourierError::Decode(format!("invalid JSON response: {e}")))?;
        Ok(to_node(value).unwrap_or_else(ResponseNode::empty))
    }
}

fn to_node(value: Value) -> Option<ResponseNode> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(ResponseNode::Text(flag.to_string())),
        Value::Number(number) => Some(ResponseNode::Text(number.to_string())),
        Value::String(text) => Some(ResponseNode::Text(text)),
        Value::Array(items) => Some(ResponseNode::List(items.into_iter().filter_map(to_node).collect())),
        Value::Object(members) => Some(ResponseNode::Map(to_map(members))),
    }
}

fn to_map(members: Map<String, Value>) -> BTreeMap<String, ResponseNode> {
    members.into_iter().filter_map(|(key, value)| to_node(value).map(|node| (key, node))).collect()
}

/// Build the [`ServiceError`] for a non-2xx response
///
/// `code_hint` (typically taken from a response header) wins over codes found
/// in the body. The body is read in either of the shapes services use:
///
/// - `{"Error": {"Code": "...", "Message": "..."}}`, optionally wrapped in
///   `ErrorResponse`
/// - `{"__type": "namespace#Code", "message": "..."}`
///
/// Anything else keeps the HTTP reason phrase as the code and a preview of the
/// raw body as the message.
pub fn parse_service_error(status: u16, code_hint: Option<&str>, body: &[u8]) -> ServiceError {
    let parsed = serde_json::from_slice::<Value>(body).ok();
    let (body_code, body_message) = parsed.as_ref().map(error_fields).unwrap_or((None, None));

    let code = code_hint
        .filter(|hint| !hint.trim().is_empty())
        .map(str::to_string)
        .or(body_code)
        .unwrap_or_else(|| fallback_code(status));
    let message = body_message.unwrap_or_else(|| preview(body));

    ServiceError::new(code, message, status)
}

fn error_fields(value: &Value) -> (Option<String>, Option<String>) {
    let error = value
        .get("Error")
        .or_else(|| value.get("ErrorResponse").and_then(|wrapper| wrapper.get("Error")));

    if let Some(error) = error {
        return (text_field(error, &["Code", "code"]), text_field(error, &["Message", "message"]));
    }

    let code = value
        .get("__type")
        .and_then(Value::as_str)
        .map(|kind| kind.rsplit('#').next().unwrap_or(kind).to_string());
    (code, text_field(value, &["message", "Message"]))
}

fn text_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| value.get(*key).and_then(Value::as_str)).map(str::to_string)
}

fn fallback_code(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(|reason| reason.replace(' ', ""))
        .unwrap_or_else(|| format!("Http{status}"))
}

fn preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty error response".to_string();
    }
    text.chars().take(ERROR_BODY_PREVIEW).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(value: Value) -> ResponseNode {
        JsonDecoder.decode(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn empty_body_decodes_to_empty_map() {
        assert_eq!(JsonDecoder.decode(b"").unwrap(), ResponseNode::empty());
        assert_eq!(JsonDecoder.decode(b"  \n").unwrap(), ResponseNode::empty());
    }

    #[test]
    fn scalars_become_text() {
        let tree = decode(json!({
            "GetQueueAttributesResult": {
                "Attributes": { "ApproximateNumberOfMessages": 7, "FifoQueue": false, "Policy": null }
            }
        }));

        let attributes = tree.at(&["GetQueueAttributesResult", "Attributes"]).unwrap().text_entries();
        assert_eq!(attributes.get("ApproximateNumberOfMessages").map(String::as_str), Some("7"));
        assert_eq!(attributes.get("FifoQueue").map(String::as_str), Some("false"));
        assert!(!attributes.contains_key("Policy"));
    }

    #[test]
    fn lists_are_indexable() {
        let tree = decode(json!({ "R": { "Message": [{ "MessageId": "a" }, { "MessageId": "b" }] } }));

        assert_eq!(tree.children(&["R", "Message"]).len(), 2);
        assert_eq!(tree.extract(&["R", "Message", "1", "MessageId"]), Some("b"));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = JsonDecoder.decode(b"{\"unterminated\": ").unwrap_err();
        assert!(matches!(err, CourierError::Decode(_)));
    }

    #[test]
    fn error_envelope_is_parsed() {
        let body = json!({ "Error": { "Code": "AWS.SimpleQueueService.NonExistentQueue", "Message": "gone" } });
        let error = parse_service_error(400, None, body.to_string().as_bytes());

        assert_eq!(error.code(), "AWS.SimpleQueueService.NonExistentQueue");
        assert_eq!(error.code_suffix(), "NonExistentQueue");
        assert_eq!(error.message(), "gone");
        assert_eq!(error.status(), 400);
    }

    #[test]
    fn wrapped_error_envelope_is_parsed() {
        let body = json!({ "ErrorResponse": { "Error": { "Code": "NotFound", "Message": "no topic" } } });
        let error = parse_service_error(404, None, body.to_string().as_bytes());

        assert_eq!(error.code(), "NotFound");
        assert_eq!(error.message(), "no topic");
    }

    #[test]
    fn typed_error_body_uses_name_after_hash() {
        let body = json!({ "__type": "com.amazonaws.sqs#QueueDeletedRecently", "message": "wait" });
        let error = parse_service_error(400, None, body.to_string().as_bytes());

        assert_eq!(error.code(), "QueueDeletedRecently");
        assert_eq!(error.message(), "wait");
    }

    #[test]
    fn code_hint_overrides_body_code() {
        let body = json!({ "__type": "com.amazonaws.sqs#QueueDoesNotExist", "message": "gone" });
        let error = parse_service_error(
            400,
            Some("AWS.SimpleQueueService.NonExistentQueue;Sender"),
            body.to_string().as_bytes(),
        );

        assert_eq!(error.code_suffix(), "NonExistentQueue");
        assert_eq!(error.message(), "gone");
    }

    #[test]
    fn unparseable_body_falls_back_to_status() {
        let error = parse_service_error(503, None, b"<html>upstream down</html>");

        assert_eq!(error.code(), "ServiceUnavailable");
        assert_eq!(error.message(), "<html>upstream down</html>");
        assert!(error.is_server_side());

        let empty = parse_service_error(500, None, b"");
        assert_eq!(empty.message(), "empty error response");
    }
}
