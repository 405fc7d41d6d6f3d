use crate::{CheckId, FactValue, Requirement};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Stable schema identifier for polsat reports.
pub const SCHEMA_REPORT_V1: &str = "polsat.report.v1";

/// Terminal outcome of one authorization run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Authorized,
    Forbidden,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Request as it looked at the terminal point of the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestSummary {
    pub name: String,
    pub state_key: String,
    /// Rendered steps, e.g. `authorize_if actor_present`.
    pub rules: Vec<String>,
    pub must_fetch: bool,
    pub strict_check_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    pub fetched: bool,
}

/// Polsat-specific payload: enough to reconstruct offline why no scenario was provably real.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct AuthorizationData {
    pub strict_access: bool,
    pub authorized: bool,
    pub scenarios: Vec<BTreeMap<CheckId, Requirement>>,
    pub facts: BTreeMap<CheckId, FactValue>,
    pub requests: Vec<RequestSummary>,

    /// Free-form state at the terminal point (user + fetched data).
    #[serde(default)]
    pub state: JsonValue,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A generic receipt/envelope.
///
/// Keeping this generic allows embedding run-specific data while still enforcing a stable outer shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportEnvelope<TData = AuthorizationData> {
    /// Versioned schema identifier for the envelope shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub decision: Decision,
    pub data: TData,
}
