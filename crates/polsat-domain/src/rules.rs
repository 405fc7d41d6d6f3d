//! Evaluation of a request's ordered rule chain against one assignment.

use crate::model::{Request, RuleKind};
use polsat_types::CheckId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Authorized,
    Forbidden,
}

/// Walk the rules in order; the first rule that decides wins, falling off the end forbids.
///
/// `lookup` returns `None` for a fact the assignment cannot rely on, which abandons the
/// evaluation and yields `None`.
pub fn evaluate_rules<F>(request: &Request, mut lookup: F) -> Option<Outcome>
where
    F: FnMut(&CheckId) -> Option<bool>,
{
    for rule in &request.rules {
        let holds = lookup(&rule.check_id(&request.name))?;
        let decided = match rule.kind {
            RuleKind::AuthorizeIf if holds => Some(Outcome::Authorized),
            RuleKind::ForbidIf if holds => Some(Outcome::Forbidden),
            RuleKind::AuthorizeUnless if !holds => Some(Outcome::Authorized),
            RuleKind::ForbidUnless if !holds => Some(Outcome::Forbidden),
            RuleKind::AuthorizeIf
            | RuleKind::ForbidIf
            | RuleKind::AuthorizeUnless
            | RuleKind::ForbidUnless => None,
        };
        if let Some(outcome) = decided {
            return Some(outcome);
        }
    }
    Some(Outcome::Forbidden)
}
