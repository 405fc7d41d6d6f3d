//! Fuzz target for the authorize loop over the built-in checks.
//!
//! Goal: any combination of rule chains, users, and fetch sources ends in a
//! decision or an ordinary error. Internal invariant violations
//! (`Inconsistent`, non-monotone facts) and panics are bugs.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_authorize
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use polsat_domain::checker::RuleChecker;
use polsat_domain::error::{AuthorizeError, CheckError, CollaboratorError};
use polsat_domain::fetch::StaticFetcher;
use polsat_domain::model::{Request, Rule, RuleKind};
use polsat_domain::policy::AuthorizeOptions;
use polsat_domain::solver::ExhaustiveSolver;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Arbitrary, Debug)]
struct FuzzRule {
    kind: u8,
    check: u8,
}

#[derive(Arbitrary, Debug)]
struct FuzzRequest {
    rules: Vec<FuzzRule>,
    must_fetch: bool,
    strict_check_only: bool,
    depends_on_previous: bool,
    has_data: bool,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    requests: Vec<FuzzRequest>,
    user: u8,
    strict_access: bool,
}

fn rule(r: &FuzzRule) -> Rule {
    let kind = match r.kind % 4 {
        0 => RuleKind::AuthorizeIf,
        1 => RuleKind::ForbidIf,
        2 => RuleKind::AuthorizeUnless,
        _ => RuleKind::ForbidUnless,
    };
    match r.check % 6 {
        0 => Rule::new(kind, "always"),
        1 => Rule::new(kind, "never"),
        2 => Rule::new(kind, "actor_present"),
        3 => Rule::new(kind, "actor_attribute_equals")
            .with_config(json!({"attribute": "role", "value": "admin"})),
        4 => Rule::new(kind, "attribute_equals")
            .with_config(json!({"attribute": "status", "value": "open"})),
        _ => Rule::new(kind, "relates_to_actor_via")
            .with_config(json!({"attribute": "author_id"})),
    }
}

fn user(choice: u8) -> Value {
    match choice % 3 {
        0 => Value::Null,
        1 => json!({"id": 1, "role": "admin"}),
        _ => json!({"id": 2, "role": "guest"}),
    }
}

fuzz_target!(|input: FuzzInput| {
    if input.requests.len() > 4 || input.requests.iter().any(|r| r.rules.len() > 4) {
        return;
    }

    let mut fetcher = StaticFetcher::default();
    let mut requests = Vec::new();
    for (i, spec) in input.requests.iter().enumerate() {
        let name = format!("r{i}");
        let mut request = Request::new(&name, spec.rules.iter().map(rule).collect());
        request.must_fetch = spec.must_fetch;
        request.strict_check_only = spec.strict_check_only;
        if spec.depends_on_previous && i > 0 {
            request = request.depends_on(&format!("r{}", i - 1));
        }
        if spec.has_data {
            fetcher = fetcher.with_source(&name, json!({"author_id": 1, "status": "open"}));
        }
        requests.push(request);
    }

    let fetcher = Arc::new(fetcher);
    let checker = RuleChecker::builtin(fetcher.clone());
    let solver = ExhaustiveSolver::default();
    let options = AuthorizeOptions {
        strict_access: input.strict_access,
        ..AuthorizeOptions::default()
    };

    match polsat_domain::authorize(
        &solver,
        &checker,
        &*fetcher,
        &user(input.user),
        &requests,
        &options,
    ) {
        Err(AuthorizeError::Inconsistent { scenario }) => {
            panic!("solver and facts disagree on {scenario:?}")
        }
        Err(AuthorizeError::Collaborator(CollaboratorError::Check(CheckError::NonMonotone {
            check,
        }))) => panic!("fact {check} was rebound"),
        _ => {}
    }
});
