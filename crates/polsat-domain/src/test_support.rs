use crate::checker::{CheckRound, Checker, RuleChecker};
use crate::error::{AuthorizeError, CheckError};
use crate::fetch::StaticFetcher;
use crate::model::{FactStore, Request, Rule, RowIdentity, Scenario, State};
use crate::policy::AuthorizeOptions;
use crate::solver::{ExhaustiveSolver, SatSolver, SolveError};
use polsat_types::{FactValue, Requirement};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn fetcher() -> Arc<StaticFetcher> {
    Arc::new(
        StaticFetcher::default()
            .with_source("post", json!({"author_id": 1}))
            .with_source("a", json!({"id": "a"}))
            .with_source("b", json!({"id": "b"}))
            .with_source("tenant", json!({"id": "t"})),
    )
}

/// `relates_to_actor_via` on `author_id`.
pub fn owned_by_actor() -> Rule {
    Rule::authorize_if("relates_to_actor_via").with_config(json!({"attribute": "author_id"}))
}

/// Built-in checker that counts how often each phase runs.
pub struct CountingChecker {
    inner: RuleChecker,
    pub strict_calls: AtomicUsize,
    pub deep_calls: AtomicUsize,
}

impl CountingChecker {
    pub fn new(fetcher: Arc<StaticFetcher>) -> Self {
        Self {
            inner: RuleChecker::builtin(fetcher),
            strict_calls: AtomicUsize::new(0),
            deep_calls: AtomicUsize::new(0),
        }
    }
}

impl Checker for CountingChecker {
    fn strict_check(
        &self,
        user: &Value,
        request: &Request,
        facts: &FactStore,
        strict_access: bool,
    ) -> (Request, FactStore) {
        self.strict_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.strict_check(user, request, facts, strict_access)
    }

    fn run_checks(
        &self,
        scenarios: &[Scenario],
        user: &Value,
        requests: &[Request],
        facts: &FactStore,
        state: &State,
        strict_access: bool,
    ) -> Result<CheckRound, CheckError> {
        self.deep_calls.fetch_add(1, Ordering::Relaxed);
        self.inner
            .run_checks(scenarios, user, requests, facts, state, strict_access)
    }
}

/// Reference collaborators wired together.
pub struct Harness {
    pub solver: ExhaustiveSolver,
    pub checker: CountingChecker,
    pub fetcher: Arc<StaticFetcher>,
}

impl Harness {
    pub fn new(fetcher: Arc<StaticFetcher>) -> Self {
        Self {
            solver: ExhaustiveSolver::default(),
            checker: CountingChecker::new(fetcher.clone()),
            fetcher,
        }
    }

    pub fn authorize(
        &self,
        user: &Value,
        requests: &[Request],
        options: &AuthorizeOptions,
    ) -> Result<State, AuthorizeError> {
        crate::authorize(
            &self.solver,
            &self.checker,
            &*self.fetcher,
            user,
            requests,
            options,
        )
    }
}

/// Never learns anything: every round hands back exactly what it was given.
pub struct StuckChecker;

impl Checker for StuckChecker {
    fn strict_check(
        &self,
        _user: &Value,
        request: &Request,
        facts: &FactStore,
        _strict_access: bool,
    ) -> (Request, FactStore) {
        (request.clone(), facts.clone())
    }

    fn run_checks(
        &self,
        _scenarios: &[Scenario],
        _user: &Value,
        requests: &[Request],
        facts: &FactStore,
        state: &State,
        _strict_access: bool,
    ) -> Result<CheckRound, CheckError> {
        Ok(CheckRound::Progress {
            requests: requests.to_vec(),
            facts: facts.clone(),
            state: state.clone(),
        })
    }
}

/// Seeds the first rule of each request as false, then drops every fact it was given.
pub struct ForgetfulChecker;

impl Checker for ForgetfulChecker {
    fn strict_check(
        &self,
        _user: &Value,
        request: &Request,
        facts: &FactStore,
        _strict_access: bool,
    ) -> (Request, FactStore) {
        let mut facts = facts.clone();
        if let Some(rule) = request.rules.first() {
            facts
                .bind(rule.check_id(&request.name), FactValue::False)
                .expect("fresh fact");
        }
        (request.clone(), facts)
    }

    fn run_checks(
        &self,
        _scenarios: &[Scenario],
        _user: &Value,
        requests: &[Request],
        _facts: &FactStore,
        state: &State,
        _strict_access: bool,
    ) -> Result<CheckRound, CheckError> {
        Ok(CheckRound::Progress {
            requests: requests.to_vec(),
            facts: FactStore::new(),
            state: state.clone(),
        })
    }
}

/// Claims every rule of every request holds, whatever the facts say.
pub struct LyingSolver;

impl SatSolver for LyingSolver {
    fn solve(
        &self,
        requests: &[Request],
        _facts: &FactStore,
        _negations: &[Scenario],
        _row_identities: Option<&[RowIdentity]>,
    ) -> Result<Scenario, SolveError> {
        Ok(requests
            .iter()
            .flat_map(Request::check_ids)
            .map(|id| (id, Requirement::True))
            .collect())
    }
}
