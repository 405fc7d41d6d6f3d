//! The `authorize` use case: decide a request document and produce a report.

use crate::document::parse_request_document;
use crate::render::MarkdownReportSink;
use crate::report::tool_meta;
use anyhow::Context;
use polsat_domain::Authorizer;
use polsat_domain::checker::RuleChecker;
use polsat_domain::error::AuthorizeError;
use polsat_domain::fetch::StaticFetcher;
use polsat_domain::model::State;
use polsat_domain::report::Report;
use polsat_domain::solver::ExhaustiveSolver;
use polsat_settings::{Overrides, PolsatConfigV1, ResolvedConfig};
use polsat_types::{Decision, ReportEnvelope, SCHEMA_REPORT_V1};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info};

/// Input for the authorize use case.
#[derive(Clone, Debug)]
pub struct AuthorizeInput<'a> {
    /// Request document contents.
    pub document_text: &'a str,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
}

/// Output from the authorize use case.
#[derive(Clone, Debug)]
pub struct AuthorizeOutput {
    pub decision: Decision,
    pub envelope: ReportEnvelope,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Run the authorize use case: parse config and document, run the engine, produce a report.
///
/// Engine outcomes (including engine errors) become the report's decision; only malformed
/// input is returned as `Err`.
pub fn run_authorize(input: AuthorizeInput<'_>) -> anyhow::Result<AuthorizeOutput> {
    let started_at = OffsetDateTime::now_utc();

    // Parse config (empty is allowed, defaults apply).
    let cfg = if input.config_text.trim().is_empty() {
        PolsatConfigV1::default()
    } else {
        polsat_settings::parse_config_toml(input.config_text).context("parse config")?
    };
    let resolved =
        polsat_settings::resolve_config(cfg, input.overrides.clone()).context("resolve config")?;
    debug!(profile = %resolved.profile, options = ?resolved.options, "resolved config");

    let document = parse_request_document(input.document_text)?;
    let requests = document.to_requests();

    let fetcher = Arc::new(StaticFetcher::new(document.data.clone()));
    let checker = RuleChecker::builtin(fetcher.clone());
    let solver = ExhaustiveSolver::with_limits(resolved.limits);
    let sink = MarkdownReportSink;

    let outcome = Authorizer::new(&solver, &checker, &*fetcher)
        .with_report_sink(&sink)
        .decide(&document.user, &requests, &resolved.options);

    let (decision, data) = match outcome {
        Ok(report) => (Decision::Authorized, report.to_data()),
        Err(AuthorizeError::Forbidden(report)) => (Decision::Forbidden, report.to_data()),
        Err(err) => {
            let partial = Report {
                requests: requests.clone(),
                state: State::for_user(document.user.clone()),
                strict_access: resolved.options.strict_access,
                ..Report::default()
            };
            let mut data = partial.to_data();
            data.error_code = Some(err.code().to_string());
            data.error_message = Some(err.to_string());
            (Decision::Error, data)
        }
    };
    info!(?decision, fetches = fetcher.fetch_count(), "authorization finished");

    let envelope = ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        started_at,
        finished_at: OffsetDateTime::now_utc(),
        decision,
        data,
    };

    Ok(AuthorizeOutput {
        decision,
        envelope,
        resolved_config: resolved,
    })
}

/// Map decision to exit code: 0 = authorized, 2 = forbidden, 1 = error.
pub fn decision_exit_code(decision: Decision) -> i32 {
    match decision {
        Decision::Authorized => 0,
        Decision::Forbidden => 2,
        Decision::Error => 1,
    }
}
