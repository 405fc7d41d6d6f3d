use crate::ids;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Canonical identity of one authorization check applied to one request.
///
/// Identity rules are simple and deterministic:
/// - `<request>/<check>` when the check carries no configuration
/// - `<request>/<check><compact json config>` otherwise
/// - the sentinels `true` and `false` are reserved for solver bookkeeping
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct CheckId(String);

impl CheckId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().trim().to_string())
    }

    pub fn for_rule(request: &str, check: &str, config: &Value) -> Self {
        if config.is_null() {
            return Self(format!("{request}/{check}"));
        }
        // serde_json maps are ordered, so the encoding is canonical.
        Self(format!("{request}/{check}{config}"))
    }

    pub fn truthy() -> Self {
        Self(ids::FACT_TRUE.to_string())
    }

    pub fn falsy() -> Self {
        Self(ids::FACT_FALSE.to_string())
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 == ids::FACT_TRUE || self.0 == ids::FACT_FALSE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CheckId {
    fn from(value: &str) -> Self {
        CheckId::new(value)
    }
}
