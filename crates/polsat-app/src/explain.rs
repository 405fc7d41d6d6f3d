//! The `explain` use case: what a rule kind decides, or what a code means for the caller.

use crate::authorize::decision_exit_code;
use polsat_domain::model::{Request, Rule, RuleKind};
use polsat_domain::rules::{Outcome, evaluate_rules};
use polsat_types::explain::{self, Explanation};
use polsat_types::{CheckId, Decision, ids};
use serde_json::Value;
use std::fmt::Write as _;

/// Result of looking up an identifier.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Found(Topic),
    NotFound { identifier: String },
}

/// A resolved identifier with its registry notes.
#[derive(Clone, Debug)]
pub struct Topic {
    pub identifier: String,
    pub notes: Explanation,
    pub subject: Subject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subject {
    RuleKind(RuleKind),
    Code(CodeSurface),
}

/// How an `authorize` run that ends with a code looks from the outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeSurface {
    pub decision: Decision,
    pub exit_code: i32,
    pub report: ReportContents,
    pub fixed_by: FixedBy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportContents {
    /// Scenarios, facts and state at the point the run stopped.
    Full,
    /// Only the submitted requests and the user; the reason is in `error_code`.
    RequestsOnly,
}

/// Who has to act before the same input can succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixedBy {
    /// The user lacks access; nothing is broken.
    Nobody,
    RequestDocument,
    Collaborator,
    /// A defect in polsat itself.
    Engine,
}

/// Look up a rule kind or an error code.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    let Some(notes) = explain::lookup_explanation(identifier) else {
        return ExplainOutput::NotFound {
            identifier: identifier.to_string(),
        };
    };

    let subject = match rule_kind(identifier) {
        Some(kind) => Subject::RuleKind(kind),
        None => match code_surface(identifier) {
            Some(surface) => Subject::Code(surface),
            None => {
                return ExplainOutput::NotFound {
                    identifier: identifier.to_string(),
                };
            }
        },
    };

    ExplainOutput::Found(Topic {
        identifier: identifier.to_string(),
        notes,
        subject,
    })
}

fn rule_kind(identifier: &str) -> Option<RuleKind> {
    serde_json::from_value(Value::from(identifier)).ok()
}

/// The decision, exit code and report shape each `AuthorizeError` code ends a run with.
pub fn code_surface(code: &str) -> Option<CodeSurface> {
    let (decision, report, fixed_by) = match code {
        ids::CODE_FORBIDDEN => (Decision::Forbidden, ReportContents::Full, FixedBy::Nobody),
        ids::CODE_NO_STEPS_CONFIGURED | ids::CODE_DEPENDENCY_DEADLOCK => (
            Decision::Error,
            ReportContents::RequestsOnly,
            FixedBy::RequestDocument,
        ),
        ids::CODE_STALLED_FETCH | ids::CODE_COLLABORATOR_ERROR => (
            Decision::Error,
            ReportContents::RequestsOnly,
            FixedBy::Collaborator,
        ),
        ids::CODE_INCONSISTENT_SOLVER_STATE => {
            (Decision::Error, ReportContents::RequestsOnly, FixedBy::Engine)
        }
        _ => return None,
    };
    Some(CodeSurface {
        decision,
        exit_code: decision_exit_code(decision),
        report,
        fixed_by,
    })
}

/// What a lone rule of `kind` does for each value of its check.
///
/// Runs the real rule evaluator with a trailing marker rule, so a rule that does not
/// decide shows up as passing control on.
fn decision_row(kind: RuleKind) -> [(bool, Option<Outcome>); 2] {
    let request = Request::new("r", vec![Rule::new(kind, "check"), Rule::authorize_if("next")]);
    let next = CheckId::new("r/next");
    [true, false].map(|holds| {
        let mut reached_next = false;
        let outcome = evaluate_rules(&request, |id| {
            if *id == next {
                reached_next = true;
            }
            Some(holds)
        });
        (holds, if reached_next { None } else { outcome })
    })
}

/// Render a topic for the terminal.
pub fn format_explanation(topic: &Topic) -> String {
    let notes = &topic.notes;
    let mut out = String::new();

    let heading = match topic.subject {
        Subject::RuleKind(_) => format!("{}: {}", notes.title, topic.identifier),
        Subject::Code(_) => format!("{} ({})", notes.title, topic.identifier),
    };
    let _ = writeln!(out, "{heading}\n{}\n", "=".repeat(heading.len()));
    let _ = writeln!(out, "{}\n", notes.description);

    match topic.subject {
        Subject::RuleKind(kind) => {
            let _ = writeln!(out, "{} <check>", kind.as_str());
            for (holds, outcome) in decision_row(kind) {
                let when = if holds { "holds" } else { "does not hold" };
                let then = match outcome {
                    Some(Outcome::Authorized) => "authorized",
                    Some(Outcome::Forbidden) => "forbidden",
                    None => "continue with the next rule",
                };
                let _ = writeln!(out, "  check {when:<14} {then}");
            }
            section(&mut out, "Writing rules", notes.remediation);
        }
        Subject::Code(surface) => {
            let report = match surface.report {
                ReportContents::Full => "scenarios, facts and state",
                ReportContents::RequestsOnly => "requests and user only, reason in `error_code`",
            };
            let fixed_by = match surface.fixed_by {
                FixedBy::Nobody => "nobody, this is a legitimate denial",
                FixedBy::RequestDocument => "the request document",
                FixedBy::Collaborator => "the fetcher or check that failed",
                FixedBy::Engine => "polsat, please report it",
            };
            let body = format!(
                "decision   {}\nexit code  {}\nreport     {report}\nfixed by   {fixed_by}",
                decision_name(surface.decision),
                surface.exit_code,
            );
            section(&mut out, "Surfaced as", &body);
            section(&mut out, "Recovery", notes.remediation);
        }
    }

    if notes.examples.before != notes.examples.after {
        let _ = writeln!(out, "\nTriggering document:");
        indent(&mut out, notes.examples.before);
        let _ = writeln!(out, "\nCorrected document:");
        indent(&mut out, notes.examples.after);
    }

    out
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "\n{title}\n{}\n{body}", "-".repeat(title.len()));
}

fn indent(out: &mut String, text: &str) {
    for line in text.lines() {
        let _ = writeln!(out, "    {line}");
    }
}

fn decision_name(decision: Decision) -> &'static str {
    match decision {
        Decision::Authorized => "authorized",
        Decision::Forbidden => "forbidden",
        Decision::Error => "error",
    }
}

/// Message for an identifier that is neither a rule kind nor a code.
pub fn format_not_found(identifier: &str) -> String {
    format!(
        "Unknown rule kind or code: {identifier}\n\nrule kinds: {}\ncodes:      {}\n",
        explain::all_rule_kinds().join(", "),
        explain::all_codes().join(", "),
    )
}
