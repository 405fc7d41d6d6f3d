//! Shared test utilities for the polsat workspace.
//!
//! `xtask` and the CLI integration tests both compare report JSON against
//! expectations, so the normalization lives in a regular library crate rather
//! than a `#[cfg(test)]` module.

use serde_json::Value;

pub const VERSION_PLACEHOLDER: &str = "__VERSION__";
pub const TIMESTAMP_PLACEHOLDER: &str = "__TIMESTAMP__";

/// Normalize non-deterministic fields of a report envelope.
///
/// Only the root object is touched, and only when it looks like an envelope
/// (`schema`, `tool`, `decision`, `data`). Everything under `data` is left as is:
/// `data.state` carries caller-supplied JSON that may legitimately contain keys
/// such as `started_at` or `version`.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    let Some(obj) = value.as_object_mut() else {
        return value;
    };
    let is_envelope = ["schema", "tool", "decision", "data"]
        .iter()
        .all(|key| obj.contains_key(*key));
    if !is_envelope {
        return value;
    }

    if let Some(tool) = obj.get_mut("tool").and_then(Value::as_object_mut)
        && tool.contains_key("version")
    {
        tool.insert(
            "version".to_string(),
            Value::String(VERSION_PLACEHOLDER.to_string()),
        );
    }
    for key in ["started_at", "finished_at"] {
        if obj.contains_key(key) {
            obj.insert(
                key.to_string(),
                Value::String(TIMESTAMP_PLACEHOLDER.to_string()),
            );
        }
    }
    value
}

/// Parse report bytes and normalize them in one step.
pub fn normalized_report(bytes: &[u8]) -> serde_json::Result<Value> {
    serde_json::from_slice(bytes).map(normalize_nondeterministic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_version_and_timestamps_are_normalized() {
        let input = json!({
            "schema": "polsat.report.v1",
            "tool": { "name": "polsat", "version": "0.1.0" },
            "started_at": "2026-01-01T00:00:00Z",
            "finished_at": "2026-01-01T00:00:01Z",
            "decision": "authorized",
            "data": { "authorized": true }
        });

        let result = normalize_nondeterministic(input);

        assert_eq!(result["tool"]["version"], VERSION_PLACEHOLDER);
        assert_eq!(result["tool"]["name"], "polsat");
        assert_eq!(result["started_at"], TIMESTAMP_PLACEHOLDER);
        assert_eq!(result["finished_at"], TIMESTAMP_PLACEHOLDER);
        assert_eq!(result["decision"], "authorized");
    }

    #[test]
    fn state_payload_is_untouched() {
        let input = json!({
            "schema": "polsat.report.v1",
            "tool": { "name": "polsat", "version": "0.1.0" },
            "started_at": "2026-01-01T00:00:00Z",
            "finished_at": "2026-01-01T00:00:01Z",
            "decision": "forbidden",
            "data": {
                "state": {
                    "user": { "id": 1 },
                    "job": { "started_at": "yesterday", "tool": { "version": "9.9.9" } }
                }
            }
        });

        let result = normalize_nondeterministic(input);

        assert_eq!(result["data"]["state"]["job"]["started_at"], "yesterday");
        assert_eq!(result["data"]["state"]["job"]["tool"]["version"], "9.9.9");
    }

    #[test]
    fn non_envelope_is_returned_unchanged() {
        let input = json!({
            "tool": { "name": "other", "version": "2.0.0" },
            "started_at": "2026-01-01T00:00:00Z"
        });

        let result = normalize_nondeterministic(input.clone());

        assert_eq!(result, input);
    }
}
