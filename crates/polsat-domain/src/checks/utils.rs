use crate::error::CheckError;
use crate::model::Request;
use serde_json::Value;

/// Required string field of a check's config.
pub fn config_str<'c>(
    config: &'c Value,
    field: &str,
    request: &Request,
    check: &str,
) -> Result<&'c str, CheckError> {
    config
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| CheckError::failed(&request.name, check, format!("missing string `{field}`")))
}

/// Optional string field of a check's config, with a fallback.
pub fn config_str_or<'c>(config: &'c Value, field: &str, default: &'c str) -> &'c str {
    config.get(field).and_then(Value::as_str).unwrap_or(default)
}

/// Required field of any type.
pub fn config_value<'c>(
    config: &'c Value,
    field: &str,
    request: &Request,
    check: &str,
) -> Result<&'c Value, CheckError> {
    config
        .get(field)
        .ok_or_else(|| CheckError::failed(&request.name, check, format!("missing `{field}`")))
}

/// A null or absent actor means nobody is signed in.
pub fn actor_present(actor: &Value) -> bool {
    !actor.is_null()
}

/// Rows a deep check runs over: arrays as-is, anything else as a single row.
pub fn rows(data: &Value) -> Vec<&Value> {
    match data {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
