//! Explain registry for error codes and rule kinds.
//!
//! Maps codes to human-readable explanations with remediation guidance.

use crate::ids;

/// Explanation entry for a code or rule kind.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the code.
    pub title: &'static str,
    /// What the code means and when it is produced.
    pub description: &'static str,
    /// How to resolve it.
    pub remediation: &'static str,
    /// Before/after request documents.
    pub examples: ExamplePair,
}

/// Before and after request document examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    /// Document that produces the code.
    pub before: &'static str,
    /// Document that does not.
    pub after: &'static str,
}

/// Look up an explanation by error code or rule kind.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        // Rule kinds
        ids::RULE_AUTHORIZE_IF
        | ids::RULE_FORBID_IF
        | ids::RULE_AUTHORIZE_UNLESS
        | ids::RULE_FORBID_UNLESS => Some(explain_rule_kinds()),

        // Codes
        ids::CODE_NO_STEPS_CONFIGURED => Some(explain_no_steps_configured()),
        ids::CODE_FORBIDDEN => Some(explain_forbidden()),
        ids::CODE_DEPENDENCY_DEADLOCK => Some(explain_dependency_deadlock()),
        ids::CODE_STALLED_FETCH => Some(explain_stalled_fetch()),
        ids::CODE_COLLABORATOR_ERROR => Some(explain_collaborator_error()),
        ids::CODE_INCONSISTENT_SOLVER_STATE => Some(explain_inconsistent_solver_state()),

        _ => None,
    }
}

/// List all known rule kinds.
pub fn all_rule_kinds() -> &'static [&'static str] {
    &[
        ids::RULE_AUTHORIZE_IF,
        ids::RULE_FORBID_IF,
        ids::RULE_AUTHORIZE_UNLESS,
        ids::RULE_FORBID_UNLESS,
    ]
}

/// List all known codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::CODE_NO_STEPS_CONFIGURED,
        ids::CODE_FORBIDDEN,
        ids::CODE_DEPENDENCY_DEADLOCK,
        ids::CODE_STALLED_FETCH,
        ids::CODE_COLLABORATOR_ERROR,
        ids::CODE_INCONSISTENT_SOLVER_STATE,
    ]
}

fn explain_rule_kinds() -> Explanation {
    Explanation {
        title: "Rule Kinds",
        description: "\
Each request carries an ordered list of rules. Rules are evaluated top to bottom and the
first rule that decides wins:

- `authorize_if <check>`: authorized when the check holds
- `forbid_if <check>`: forbidden when the check holds
- `authorize_unless <check>`: authorized when the check does not hold
- `forbid_unless <check>`: forbidden when the check does not hold

Falling off the end of the list forbids the request.",
        remediation: "\
Order rules from most specific to most general. End the list with an explicit
`authorize_if` so the fallthrough case is intentional.",
        examples: ExamplePair {
            before: r#"[[requests]]
name = "post.read"
rules = [{ kind = "forbid_unless", check = "actor_present" }]"#,
            after: r#"[[requests]]
name = "post.read"
rules = [
  { kind = "forbid_unless", check = "actor_present" },
  { kind = "authorize_if", check = "always" },
]"#,
        },
    }
}

fn explain_no_steps_configured() -> Explanation {
    Explanation {
        title: "No Authorization Steps Configured",
        description: "\
A request was submitted with an empty rule list. This is a configuration defect, not an
authorization outcome: polsat refuses to guess and fails before any solving happens.",
        remediation: "\
Give every request at least one rule. A request that is always allowed should say so
with `authorize_if always`.",
        examples: ExamplePair {
            before: r#"[[requests]]
name = "post.read"
rules = []"#,
            after: r#"[[requests]]
name = "post.read"
rules = [{ kind = "authorize_if", check = "always" }]"#,
        },
    }
}

fn explain_forbidden() -> Explanation {
    Explanation {
        title: "Forbidden",
        description: "\
No assignment of check outcomes authorizes every request, or every remaining scenario
depends on facts that could not be resolved, or a check round made no progress.

The report carries the scenario set, the fact store and the state at the moment of
failure so the decision can be reconstructed offline.",
        remediation: "\
Inspect the scenarios in the report. Each scenario lists the check outcomes that would
have authorized the requests; compare them against the facts to find the blocking check.",
        examples: ExamplePair {
            before: r#"user = { id = 1, role = "guest" }

[[requests]]
name = "post.delete"
rules = [{ kind = "authorize_if", check = "actor_attribute_equals", config = { attribute = "role", value = "admin" } }]"#,
            after: r#"user = { id = 1, role = "admin" }

[[requests]]
name = "post.delete"
rules = [{ kind = "authorize_if", check = "actor_attribute_equals", config = { attribute = "role", value = "admin" } }]"#,
        },
    }
}

fn explain_dependency_deadlock() -> Explanation {
    Explanation {
        title: "Dependency Deadlock",
        description: "\
Data fetching could not proceed: some unfetched requests depend on data that no fetchable
request will ever provide. A common cause is two requests that each depend on the other.",
        remediation: "\
Break the cycle so that at least one request can be fetched with its dependencies met,
or mark the upstream request `must_fetch = true`.",
        examples: ExamplePair {
            before: r#"[[requests]]
name = "a"
must_fetch = true
dependencies = ["b"]

[[requests]]
name = "b"
must_fetch = true
dependencies = ["a"]"#,
            after: r#"[[requests]]
name = "a"
must_fetch = true

[[requests]]
name = "b"
must_fetch = true
dependencies = ["a"]"#,
        },
    }
}

fn explain_stalled_fetch() -> Explanation {
    Explanation {
        title: "Stalled Fetch",
        description: "\
A whole batch of fetches completed without changing the state. Repeating it would loop
forever, so polsat stops. This usually means a fetcher stores its data under a key other
than the request's state key.",
        remediation: "\
Make sure each fetch writes the request's data under its `state_key`.",
        examples: ExamplePair {
            before: r#"[[requests]]
name = "post"
state_key = "posts"
must_fetch = true

[data]
post = { id = 1 }"#,
            after: r#"[[requests]]
name = "post"
state_key = "posts"
must_fetch = true

[data]
posts = { id = 1 }"#,
        },
    }
}

fn explain_collaborator_error() -> Explanation {
    Explanation {
        title: "Collaborator Error",
        description: "\
A fetcher, deep check or solver failed. The error is passed through unchanged and aborts
the whole run; polsat never retries internally.",
        remediation: "\
Fix the failing collaborator. Retries, if wanted, belong in the fetcher itself.",
        examples: ExamplePair {
            before: r#"[[requests]]
name = "post.read"
rules = [{ kind = "authorize_if", check = "no_such_check" }]"#,
            after: r#"[[requests]]
name = "post.read"
rules = [{ kind = "authorize_if", check = "actor_present" }]"#,
        },
    }
}

fn explain_inconsistent_solver_state() -> Explanation {
    Explanation {
        title: "Inconsistent Solver State",
        description: "\
The solver returned a scenario as satisfiable that the fact store contradicts. This is a
defect in fact propagation or in the solver's encoding, never a legitimate denial, and
is reported separately from `forbidden`.",
        remediation: "\
Report the run with its request document. The solver must fix every fact bound to
`true` or `false` and must never rely on an `unknowable` fact.",
        examples: ExamplePair {
            before: "# any document; this is an engine defect",
            after: "# any document; this is an engine defect",
        },
    }
}
