//! Use case orchestration for polsat.
//!
//! This crate provides the application layer: use cases that coordinate the settings, domain,
//! and render layers. It is intentionally thin and delegates heavy lifting to those crates.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod authorize;
mod document;
mod explain;
mod render;
mod report;

pub use authorize::{AuthorizeInput, AuthorizeOutput, decision_exit_code, run_authorize};
pub use document::{RequestDocument, RequestSpec, parse_request_document};
pub use explain::{
    CodeSurface, ExplainOutput, FixedBy, ReportContents, Subject, Topic, code_surface,
    format_explanation, format_not_found, run_explain,
};
pub use render::{MarkdownReportSink, render_markdown, to_renderable};
pub use report::{
    parse_report_json, runtime_error_report, serialize_report, write_report, write_text,
};
