//! Queue access policy granting a topic permission to deliver

use courier_domain::{CourierError, Result};
use serde_json::{json, Value};

const POLICY_VERSION: &str = "2012-10-17";

/// Add a statement allowing `topic` to send to `queue_arn`
///
/// `existing` is the queue's current policy document, if any. Statements
/// already present are kept. Returns `None` when a statement with `sid`
/// already exists and nothing needs to change.
///
/// # Errors
///
/// `CourierError::Decode` when the existing policy is not a JSON object.
pub fn grant_topic_delivery(
    existing: Option<&str>,
    sid: &str,
    queue_arn: &str,
    topic: &str,
) -> Result<Option<String>> {
    let mut policy = match existing.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => serde_json::from_str::<Value>(raw)?,
        None => json!({ "Version": POLICY_VERSION, "Statement": [] }),
    };

    let document = policy
        .as_object_mut()
        .ok_or_else(|| CourierError::Decode("queue policy is not a JSON object".into()))?;
    let statements = document.entry("Statement").or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Object(_) = statements {
        *statements = Value::Array(vec![statements.take()]);
    }
    let Value::Array(statements) = statements else {
        return Err(CourierError::Decode("queue policy Statement is not a list".into()));
    };

    if statements.iter().any(|statement| statement.get("Sid").and_then(Value::as_str) == Some(sid)) {
        return Ok(None);
    }

    statements.push(json!({
        "Sid": sid,
        "Effect": "Allow",
        "Principal": { "AWS": "*" },
        "Action": "SQS:SendMessage",
        "Resource": queue_arn,
        "Condition": { "StringLike": { "aws:SourceArn": topic } },
    }));

    Ok(Some(policy.to_string()))
}
