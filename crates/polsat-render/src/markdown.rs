use crate::{RenderableReport, RenderableRequest, RenderableVerdict};

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str("# Polsat report\n\n");
    let verdict = match report.verdict {
        RenderableVerdict::Authorized => "AUTHORIZED",
        RenderableVerdict::Forbidden => "FORBIDDEN",
        RenderableVerdict::Error => "ERROR",
    };
    out.push_str(&format!(
        "- Verdict: **{}**\n- Strict access: {}\n- Scenarios: {} / Facts: {}\n\n",
        verdict,
        if report.strict_access { "yes" } else { "no" },
        report.scenarios.len(),
        report.facts.len()
    ));

    if let Some(err) = &report.error {
        out.push_str(&format!("> Error `{}`: {}\n\n", err.code, err.message));
    }

    if !report.scenarios.is_empty() {
        out.push_str("## Scenarios\n\n| # | Requirements |\n|---|---|\n");
        for (i, scenario) in report.scenarios.iter().enumerate() {
            let clauses: Vec<String> = scenario
                .iter()
                .map(|c| format!("`{}` = {}", c.fact, c.requirement))
                .collect();
            let clauses = if clauses.is_empty() {
                "(unconditional)".to_string()
            } else {
                clauses.join(", ")
            };
            out.push_str(&format!("| {} | {} |\n", i + 1, clauses));
        }
        out.push('\n');
    }

    if !report.facts.is_empty() {
        out.push_str("## Facts\n\n");
        for f in &report.facts {
            out.push_str(&format!("- `{}`: {}\n", f.fact, f.value));
        }
        out.push('\n');
    }

    if report.requests.is_empty() {
        out.push_str("No requests.\n");
        return out;
    }

    out.push_str("## Requests\n\n");
    for r in &report.requests {
        render_request(&mut out, r);
    }

    out
}

fn render_request(out: &mut String, r: &RenderableRequest) {
    let mut flags = vec![if r.fetched { "fetched" } else { "not fetched" }];
    if r.must_fetch {
        flags.push("must fetch");
    }
    if r.strict_check_only {
        flags.push("strict checks only");
    }
    out.push_str(&format!("- `{}` ({})\n", r.name, flags.join(", ")));
    for rule in &r.rules {
        out.push_str(&format!("  - {}\n", rule));
    }
    if !r.dependencies.is_empty() {
        out.push_str(&format!("  - depends on: {}\n", r.dependencies.join(", ")));
    }
}
