use crate::checker::{CheckRound, Checker};
use crate::error::{AuthorizeError, CheckError, CollaboratorError};
use crate::fetch::{Fetcher, fetch_must_fetch};
use crate::model::{FactStore, Request, Scenario, State};
use crate::policy::AuthorizeOptions;
use crate::report::{PlainReportSink, Report, ReportSink};
use crate::scenarios::{ScenarioStatus, remove_irrelevant_clauses, scenario_is_reality};
use crate::solver::{SatSolver, SolveError};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Drives the solve / check / fetch loop over borrowed collaborators.
pub struct Authorizer<'a> {
    solver: &'a dyn SatSolver,
    checker: &'a dyn Checker,
    fetcher: &'a dyn Fetcher,
    sink: Option<&'a dyn ReportSink>,
}

enum Enumeration {
    /// A scenario already holds; the rest were not searched.
    Reality(Vec<Scenario>),
    Candidates(Vec<Scenario>),
}

impl<'a> Authorizer<'a> {
    pub fn new(
        solver: &'a dyn SatSolver,
        checker: &'a dyn Checker,
        fetcher: &'a dyn Fetcher,
    ) -> Self {
        Self {
            solver,
            checker,
            fetcher,
            sink: None,
        }
    }

    /// Render terminal reports through `sink` instead of the plain text renderer.
    pub fn with_report_sink(mut self, sink: &'a dyn ReportSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Decide whether `requests` are authorized for `user`.
    ///
    /// Returns the final state, with every must-fetch request materialized, when some
    /// scenario is proven real.
    pub fn authorize(
        &self,
        user: &Value,
        requests: &[Request],
        options: &AuthorizeOptions,
    ) -> Result<State, AuthorizeError> {
        self.decide(user, requests, options).map(|report| report.state)
    }

    /// Like [`Authorizer::authorize`], but hands back the full terminal report on success.
    ///
    /// Enumeration stops at the first scenario proven real, so an authorized report lists
    /// that scenario plus the ones found before it, not every scenario that could hold.
    /// The listed scenarios are minimized either way.
    pub fn decide(
        &self,
        user: &Value,
        requests: &[Request],
        options: &AuthorizeOptions,
    ) -> Result<Report, AuthorizeError> {
        if let Some(request) = requests.iter().find(|r| r.rules.is_empty()) {
            return Err(AuthorizeError::NoStepsConfigured {
                request: request.name.clone(),
            });
        }

        let state = State::for_user(user.clone());

        if options.fetch_only {
            let state = fetch_must_fetch(requests, state, self.fetcher)?;
            info!(requests = requests.len(), "fetch-only run complete");
            return Ok(Report {
                requests: requests.to_vec(),
                state,
                strict_access: options.strict_access,
                authorized: true,
                ..Report::default()
            });
        }

        let mut facts = FactStore::new();
        let mut current = Vec::with_capacity(requests.len());
        for request in requests {
            let (seeded, next) =
                self.checker
                    .strict_check(user, request, &facts, options.strict_access);
            facts = next;
            current.push(seeded);
        }

        self.run(user, current, facts, state, options)
    }

    fn run(
        &self,
        user: &Value,
        mut requests: Vec<Request>,
        mut facts: FactStore,
        mut state: State,
        options: &AuthorizeOptions,
    ) -> Result<Report, AuthorizeError> {
        let mut scenarios = Vec::new();

        for iteration in 0..options.max_iterations {
            scenarios = match self.enumerate(&requests, &facts, &state)? {
                Enumeration::Reality(found) => {
                    let found = remove_irrelevant_clauses(found);
                    return self.authorized(found, requests, facts, state, options);
                }
                Enumeration::Candidates(found) if found.is_empty() => {
                    debug!(iteration, "no scenario authorizes the requests");
                    return Err(self.forbidden(found, requests, facts, state, options));
                }
                Enumeration::Candidates(found) => remove_irrelevant_clauses(found),
            };
            debug!(
                iteration,
                scenarios = scenarios.len(),
                facts = facts.len(),
                "scenarios enumerated"
            );

            if scenarios
                .iter()
                .any(|s| scenario_is_reality(s, &facts) == ScenarioStatus::Reality)
            {
                return self.authorized(scenarios, requests, facts, state, options);
            }

            let round = self
                .checker
                .run_checks(
                    &scenarios,
                    user,
                    &requests,
                    &facts,
                    &state,
                    options.strict_access,
                )
                .map_err(CollaboratorError::from)?;

            match round {
                CheckRound::AllScenariosKnown => {
                    debug!(iteration, "nothing left to learn");
                    return Err(self.forbidden(scenarios, requests, facts, state, options));
                }
                CheckRound::Progress {
                    requests: next_requests,
                    facts: next_facts,
                    state: next_state,
                } => {
                    if let Some(check) = facts.first_violation_in(&next_facts) {
                        error!(fact = %check, "checker rebound a known fact");
                        return Err(CollaboratorError::from(CheckError::NonMonotone { check }).into());
                    }
                    if next_requests == requests && next_facts == facts && next_state == state {
                        debug!(iteration, "check round made no progress");
                        return Err(self.forbidden(scenarios, requests, facts, state, options));
                    }
                    requests = next_requests;
                    facts = next_facts;
                    state = next_state;
                }
            }
        }

        warn!(
            max_iterations = options.max_iterations,
            "iteration cap reached without a decision"
        );
        Err(self.forbidden(scenarios, requests, facts, state, options))
    }

    /// Ask the solver for every scenario, negating each one found, until it runs dry or
    /// one of them already holds.
    fn enumerate(
        &self,
        requests: &[Request],
        facts: &FactStore,
        state: &State,
    ) -> Result<Enumeration, AuthorizeError> {
        let rows = state.row_identities();
        let mut found: Vec<Scenario> = Vec::new();

        loop {
            let scenario = match self.solver.solve(requests, facts, &found, rows.as_deref()) {
                Ok(scenario) => scenario,
                Err(SolveError::Unsatisfiable) => return Ok(Enumeration::Candidates(found)),
                Err(err) => return Err(CollaboratorError::from(err).into()),
            };
            debug!(?scenario, "scenario found");

            if found.contains(&scenario) {
                error!(?scenario, "solver repeated a negated scenario");
                return Err(AuthorizeError::Inconsistent { scenario });
            }
            match scenario_is_reality(&scenario, facts) {
                ScenarioStatus::Reality => {
                    found.push(scenario);
                    return Ok(Enumeration::Reality(found));
                }
                ScenarioStatus::NotReality => {
                    error!(?scenario, "solver returned a scenario the facts contradict");
                    return Err(AuthorizeError::Inconsistent { scenario });
                }
                ScenarioStatus::Maybe => found.push(scenario),
            }
        }
    }

    fn authorized(
        &self,
        scenarios: Vec<Scenario>,
        requests: Vec<Request>,
        facts: FactStore,
        state: State,
        options: &AuthorizeOptions,
    ) -> Result<Report, AuthorizeError> {
        let state = fetch_must_fetch(&requests, state, self.fetcher)?;
        info!(requests = requests.len(), facts = facts.len(), "authorized");
        let report = Report {
            scenarios,
            requests,
            facts,
            state,
            strict_access: options.strict_access,
            authorized: true,
        };
        self.log_report(&report, options);
        Ok(report)
    }

    fn forbidden(
        &self,
        scenarios: Vec<Scenario>,
        requests: Vec<Request>,
        facts: FactStore,
        state: State,
        options: &AuthorizeOptions,
    ) -> AuthorizeError {
        info!(
            requests = requests.len(),
            scenarios = scenarios.len(),
            "forbidden"
        );
        let report = Report {
            scenarios,
            requests,
            facts,
            state,
            strict_access: options.strict_access,
            authorized: false,
        };
        self.log_report(&report, options);
        AuthorizeError::Forbidden(Box::new(report))
    }

    fn log_report(&self, report: &Report, options: &AuthorizeOptions) {
        if !options.log_final_report {
            return;
        }
        let text = match self.sink {
            Some(sink) => sink.render(report),
            None => PlainReportSink.render(report),
        };
        info!(target: "polsat_domain::report", "{text}");
    }
}

/// One-shot form of [`Authorizer::authorize`].
pub fn authorize(
    solver: &dyn SatSolver,
    checker: &dyn Checker,
    fetcher: &dyn Fetcher,
    user: &Value,
    requests: &[Request],
    options: &AuthorizeOptions,
) -> Result<State, AuthorizeError> {
    Authorizer::new(solver, checker, fetcher).authorize(user, requests, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use crate::model::Rule;
    use crate::test_support::*;
    use polsat_types::{CheckId, FactValue, Requirement};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use tracing_test::traced_test;

    #[test]
    fn empty_steps_fail_before_solving() {
        let harness = Harness::new(fetcher());
        let requests = vec![
            Request::new("ok", vec![Rule::authorize_if("always")]),
            Request::new("empty", vec![]),
        ];
        let err = harness
            .authorize(&json!({"id": 1}), &requests, &AuthorizeOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            AuthorizeError::NoStepsConfigured {
                request: "empty".into()
            }
        );
        assert_eq!(harness.checker.strict_calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn strict_true_authorizes_without_a_deep_round() {
        let harness = Harness::new(fetcher());
        let requests = vec![Request::new("post", vec![Rule::authorize_if("actor_present")])];
        let state = harness
            .authorize(&json!({"id": 1}), &requests, &AuthorizeOptions::default())
            .unwrap();
        assert_eq!(state.user(), &json!({"id": 1}));
        assert_eq!(harness.checker.deep_calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn decide_returns_the_winning_scenario() {
        let harness = Harness::new(fetcher());
        let requests = vec![Request::new("post", vec![Rule::authorize_if("actor_present")])];
        let report = Authorizer::new(&harness.solver, &harness.checker, &*harness.fetcher)
            .decide(&json!({"id": 1}), &requests, &AuthorizeOptions::default())
            .unwrap();
        assert!(report.authorized);
        assert_eq!(report.scenarios.len(), 1);
    }

    #[test]
    fn winning_scenario_is_reported_without_irrelevant_clauses() {
        let fetcher = Arc::new(StaticFetcher::default().with_source("rows", json!([])));
        let harness = Harness::new(fetcher);
        let guard =
            Rule::forbid_if("relates_to_actor_via").with_config(json!({"attribute": "author_id"}));
        let requests = vec![Request::new("rows", vec![guard.clone(), Rule::authorize_if("always")])];
        let report = Authorizer::new(&harness.solver, &harness.checker, &*harness.fetcher)
            .decide(&json!({"id": 1}), &requests, &AuthorizeOptions::default())
            .unwrap();

        assert_eq!(
            report.facts.get(&guard.check_id("rows")),
            Some(FactValue::Irrelevant)
        );
        let expected: Scenario = [(CheckId::new("rows/always"), Requirement::True)]
            .into_iter()
            .collect();
        assert_eq!(report.scenarios, vec![expected]);
    }

    #[test]
    fn strict_false_is_forbidden() {
        let harness = Harness::new(fetcher());
        let requests = vec![Request::new("post", vec![Rule::authorize_if("actor_present")])];
        let err = harness
            .authorize(&Value::Null, &requests, &AuthorizeOptions::default())
            .unwrap_err();
        let report = err.report().expect("forbidden report");
        assert!(!report.authorized);
        assert!(report.scenarios.is_empty());
        assert_eq!(
            report.facts.get(&CheckId::new("post/actor_present")),
            Some(FactValue::False)
        );
    }

    #[test]
    fn shared_must_fetch_dependency_fetches_everything() {
        let fetcher = fetcher();
        let harness = Harness::new(fetcher.clone());
        let requests = vec![
            Request::new("a", vec![Rule::authorize_if("always")])
                .must_fetch()
                .depends_on("tenant"),
            Request::new("b", vec![Rule::authorize_if("always")])
                .must_fetch()
                .depends_on("tenant"),
            Request::new("tenant", vec![Rule::authorize_if("actor_present")]).must_fetch(),
        ];
        let state = harness
            .authorize(&json!({"id": 1}), &requests, &AuthorizeOptions::default())
            .unwrap();
        for key in ["a", "b", "tenant"] {
            assert!(state.contains(key), "{key} not fetched");
        }
        assert_eq!(fetcher.fetch_count(), 3);
    }

    #[test]
    fn deep_check_fetches_then_authorizes() {
        let fetcher = fetcher();
        let harness = Harness::new(fetcher.clone());
        let requests = vec![Request::new("post", vec![owned_by_actor()])];
        let state = harness
            .authorize(&json!({"id": 1}), &requests, &AuthorizeOptions::default())
            .unwrap();
        assert!(state.contains("post"));
        assert_eq!(harness.checker.deep_calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn deep_check_pulls_in_the_data_it_depends_on() {
        let fetcher = fetcher();
        let harness = Harness::new(fetcher.clone());
        let requests = vec![
            Request::new("post", vec![owned_by_actor()]).depends_on("tenant"),
            Request::new("tenant", vec![Rule::authorize_if("always")]),
        ];
        let state = harness
            .authorize(&json!({"id": 1}), &requests, &AuthorizeOptions::default())
            .unwrap();
        assert!(state.contains("tenant"));
        assert!(state.contains("post"));
        assert_eq!(fetcher.fetch_count(), 2);
    }

    #[test]
    fn deep_check_mismatch_is_forbidden() {
        let harness = Harness::new(fetcher());
        let requests = vec![Request::new("post", vec![owned_by_actor()])];
        let err = harness
            .authorize(&json!({"id": 2}), &requests, &AuthorizeOptions::default())
            .unwrap_err();
        let report = err.report().expect("forbidden report");
        assert!(report.state.contains("post"));
        assert_eq!(
            report.facts.get(&owned_by_actor().check_id("post")),
            Some(FactValue::False)
        );
    }

    #[test]
    fn lenient_access_forbids_without_fetching() {
        let fetcher = fetcher();
        let harness = Harness::new(fetcher.clone());
        let requests = vec![Request::new("post", vec![owned_by_actor()])];
        let err = harness
            .authorize(&json!({"id": 1}), &requests, &AuthorizeOptions::lenient())
            .unwrap_err();
        assert!(matches!(err, AuthorizeError::Forbidden(_)));
        assert_eq!(fetcher.fetch_count(), 0);
    }

    #[test]
    fn alternative_scenario_rescues_a_failed_one() {
        let harness = Harness::new(fetcher());
        let requests = vec![Request::new(
            "post",
            vec![owned_by_actor(), Rule::authorize_if("always")],
        )];
        let state = harness
            .authorize(&json!({"id": 2}), &requests, &AuthorizeOptions::default())
            .unwrap();
        assert_eq!(state.user(), &json!({"id": 2}));
    }

    #[test]
    fn mutually_dependent_must_fetch_requests_deadlock() {
        let harness = Harness::new(fetcher());
        let requests = vec![
            Request::new("a", vec![Rule::authorize_if("always")])
                .must_fetch()
                .depends_on("b"),
            Request::new("b", vec![Rule::authorize_if("always")])
                .must_fetch()
                .depends_on("a"),
        ];
        let err = harness
            .authorize(&json!({"id": 1}), &requests, &AuthorizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, AuthorizeError::DependencyDeadlock { .. }));
    }

    #[test]
    fn stuck_checker_terminates_forbidden() {
        let fetcher = fetcher();
        let solver = crate::solver::ExhaustiveSolver::default();
        let checker = StuckChecker;
        let requests = vec![Request::new("post", vec![owned_by_actor()])];
        let err = authorize(
            &solver,
            &checker,
            &*fetcher,
            &json!({"id": 1}),
            &requests,
            &AuthorizeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AuthorizeError::Forbidden(_)));
    }

    #[test]
    fn rebinding_checker_is_a_collaborator_error() {
        let fetcher = fetcher();
        let solver = crate::solver::ExhaustiveSolver::default();
        let checker = ForgetfulChecker;
        let requests = vec![Request::new(
            "post",
            vec![Rule::forbid_if("never"), owned_by_actor()],
        )];
        let err = authorize(
            &solver,
            &checker,
            &*fetcher,
            &json!({"id": 1}),
            &requests,
            &AuthorizeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AuthorizeError::Collaborator(CollaboratorError::Check(CheckError::NonMonotone { .. }))
        ));
    }

    #[test]
    fn contradicted_solver_scenario_is_inconsistent_not_forbidden() {
        let fetcher = fetcher();
        let checker = crate::checker::RuleChecker::builtin(fetcher.clone());
        let requests = vec![Request::new("post", vec![Rule::authorize_if("actor_present")])];
        let err = authorize(
            &LyingSolver,
            &checker,
            &*fetcher,
            &Value::Null,
            &requests,
            &AuthorizeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AuthorizeError::Inconsistent { .. }));
    }

    #[test]
    fn fetch_only_skips_checking() {
        let fetcher = fetcher();
        let harness = Harness::new(fetcher.clone());
        let requests = vec![
            Request::new("post", vec![Rule::authorize_if("never")]).must_fetch(),
        ];
        let state = harness
            .authorize(&Value::Null, &requests, &AuthorizeOptions::fetch_only())
            .unwrap();
        assert!(state.contains("post"));
        assert_eq!(harness.checker.strict_calls.load(Ordering::Relaxed), 0);
    }

    #[traced_test]
    #[test]
    fn final_report_is_logged_only_when_asked() {
        let harness = Harness::new(fetcher());
        let requests = vec![Request::new("post", vec![Rule::authorize_if("always")])];
        harness
            .authorize(&json!({"id": 1}), &requests, &AuthorizeOptions::default())
            .unwrap();
        assert!(!logs_contain("verdict: authorized"));

        let options = AuthorizeOptions {
            log_final_report: true,
            ..AuthorizeOptions::default()
        };
        harness.authorize(&json!({"id": 1}), &requests, &options).unwrap();
        assert!(logs_contain("verdict: authorized"));
    }
}
