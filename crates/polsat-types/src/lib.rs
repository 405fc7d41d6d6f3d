//! Stable DTOs and IDs used across the polsat workspace.
//!
//! This crate is intentionally boring:
//! - fact values and scenario requirements
//! - canonical check identities
//! - data types for the emitted authorization report
//! - explain registry for error codes

#![forbid(unsafe_code)]

pub mod check_id;
pub mod explain;
pub mod fact;
pub mod ids;
pub mod receipt;

pub use check_id::CheckId;
pub use explain::{ExamplePair, Explanation, lookup_explanation};
pub use fact::{FactValue, Requirement};
pub use receipt::{
    AuthorizationData, Decision, ReportEnvelope, RequestSummary, SCHEMA_REPORT_V1, ToolMeta,
};
