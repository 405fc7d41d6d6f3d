use crate::model::{FactStore, Request, Scenario, State};
use polsat_types::{AuthorizationData, RequestSummary};
use std::fmt::Write as _;

/// Snapshot of an authorization run at a terminal point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub scenarios: Vec<Scenario>,
    pub requests: Vec<Request>,
    pub facts: FactStore,
    pub state: State,
    pub strict_access: bool,
    pub authorized: bool,
}

impl Report {
    pub fn to_data(&self) -> AuthorizationData {
        let requests = self
            .requests
            .iter()
            .map(|r| RequestSummary {
                name: r.name.clone(),
                state_key: r.state_key.clone(),
                rules: r.rules.iter().map(|rule| rule.describe()).collect(),
                must_fetch: r.must_fetch,
                strict_check_only: r.strict_check_only,
                dependencies: r.dependencies.clone(),
                fetched: self.state.contains(&r.state_key),
            })
            .collect();

        AuthorizationData {
            strict_access: self.strict_access,
            authorized: self.authorized,
            scenarios: self.scenarios.clone(),
            facts: self.facts.to_map(),
            requests,
            state: self.state.to_json(),
            error_code: None,
            error_message: None,
        }
    }
}

/// Renders a report for the log. Never influences the decision.
pub trait ReportSink: Send + Sync {
    fn render(&self, report: &Report) -> String;
}

/// Compact single-block text rendering.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainReportSink;

impl ReportSink for PlainReportSink {
    fn render(&self, report: &Report) -> String {
        let mut out = String::new();
        let verdict = if report.authorized {
            "authorized"
        } else {
            "forbidden"
        };
        let _ = writeln!(out, "verdict: {verdict} (strict_access={})", report.strict_access);

        for (i, scenario) in report.scenarios.iter().enumerate() {
            let clauses: Vec<String> = scenario
                .iter()
                .map(|(id, req)| format!("{id}={}", req.as_str()))
                .collect();
            let _ = writeln!(out, "scenario {}: {}", i + 1, clauses.join(", "));
        }
        for (id, value) in report.facts.iter().filter(|(id, _)| !id.is_sentinel()) {
            let _ = writeln!(out, "fact {id} = {}", value.as_str());
        }
        for request in &report.requests {
            let fetched = if report.state.contains(&request.state_key) {
                "fetched"
            } else {
                "not fetched"
            };
            let _ = writeln!(out, "request {} ({fetched})", request.name);
        }
        out
    }
}
