use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_CONFIG_V1: &str = "polsat.config.v1";

/// `polsat.toml` schema v1.
///
/// This is a *user-facing* config model: every field is optional so a profile can supply it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PolsatConfigV1 {
    /// Optional schema string for tooling (`polsat.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// `strict` (default), `lenient`, or `fetch-only`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Force unresolved facts through deep checks instead of treating them as inconclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_access: Option<bool>,

    /// Skip authorization and only materialize must-fetch data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_only: Option<bool>,

    /// Log the rendered report at every terminal point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_final_report: Option<bool>,

    /// Cap on solve/check rounds before giving up as forbidden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,

    /// Cap on free facts the reference solver will enumerate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_variables: Option<u32>,
}
