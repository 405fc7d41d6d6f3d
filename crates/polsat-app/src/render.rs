//! Render use cases: markdown from in-memory or on-disk reports.

use polsat_domain::report::{Report, ReportSink};
use polsat_render::{
    RenderableClause, RenderableError, RenderableFact, RenderableReport, RenderableRequest,
    RenderableVerdict,
};
use polsat_types::{AuthorizationData, Decision, ReportEnvelope};

pub fn render_markdown(report: &RenderableReport) -> String {
    polsat_render::render_markdown(report)
}

pub fn to_renderable(envelope: &ReportEnvelope) -> RenderableReport {
    renderable_from_data(
        match envelope.decision {
            Decision::Authorized => RenderableVerdict::Authorized,
            Decision::Forbidden => RenderableVerdict::Forbidden,
            Decision::Error => RenderableVerdict::Error,
        },
        &envelope.data,
    )
}

fn renderable_from_data(verdict: RenderableVerdict, data: &AuthorizationData) -> RenderableReport {
    RenderableReport {
        verdict,
        strict_access: data.strict_access,
        scenarios: data
            .scenarios
            .iter()
            .map(|scenario| {
                scenario
                    .iter()
                    .map(|(fact, requirement)| RenderableClause {
                        fact: fact.to_string(),
                        requirement: requirement.as_str().to_string(),
                    })
                    .collect()
            })
            .collect(),
        facts: data
            .facts
            .iter()
            .filter(|(fact, _)| !fact.is_sentinel())
            .map(|(fact, value)| RenderableFact {
                fact: fact.to_string(),
                value: value.as_str().to_string(),
            })
            .collect(),
        requests: data
            .requests
            .iter()
            .map(|r| RenderableRequest {
                name: r.name.clone(),
                rules: r.rules.clone(),
                must_fetch: r.must_fetch,
                strict_check_only: r.strict_check_only,
                dependencies: r.dependencies.clone(),
                fetched: r.fetched,
            })
            .collect(),
        error: data.error_code.as_ref().map(|code| RenderableError {
            code: code.clone(),
            message: data.error_message.clone().unwrap_or_default(),
        }),
    }
}

/// Feeds the engine's terminal reports through the Markdown renderer.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownReportSink;

impl ReportSink for MarkdownReportSink {
    fn render(&self, report: &Report) -> String {
        let verdict = if report.authorized {
            RenderableVerdict::Authorized
        } else {
            RenderableVerdict::Forbidden
        };
        render_markdown(&renderable_from_data(verdict, &report.to_data()))
    }
}
