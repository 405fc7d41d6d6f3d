//! Stable identifiers for sentinel facts, rule kinds, and error codes.
//!
//! Codes are short snake_case discriminators that show up in reports and in `polsat explain`.

// Sentinel facts permanently bound in every fact store.
pub const FACT_TRUE: &str = "true";
pub const FACT_FALSE: &str = "false";

// Rule kinds
pub const RULE_AUTHORIZE_IF: &str = "authorize_if";
pub const RULE_FORBID_IF: &str = "forbid_if";
pub const RULE_AUTHORIZE_UNLESS: &str = "authorize_unless";
pub const RULE_FORBID_UNLESS: &str = "forbid_unless";

// Error codes
pub const CODE_NO_STEPS_CONFIGURED: &str = "no_steps_configured";
pub const CODE_FORBIDDEN: &str = "forbidden";
pub const CODE_DEPENDENCY_DEADLOCK: &str = "dependency_deadlock";
pub const CODE_STALLED_FETCH: &str = "stalled_fetch";
pub const CODE_COLLABORATOR_ERROR: &str = "collaborator_error";
pub const CODE_INCONSISTENT_SOLVER_STATE: &str = "inconsistent_solver_state";

// Tool-level
pub const CODE_RUNTIME_ERROR: &str = "runtime_error";
