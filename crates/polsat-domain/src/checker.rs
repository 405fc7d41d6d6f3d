//! Fact resolution: strict seeding and deep check rounds.

use crate::checks::{Check, CheckRegistry, StrictOutcome};
use crate::error::CheckError;
use crate::fetch::Fetcher;
use crate::model::{FactStore, Request, Rule, Scenario, State};
use polsat_types::{CheckId, FactValue};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one deep check round.
#[derive(Clone, Debug, PartialEq)]
pub enum CheckRound {
    /// Nothing referenced by the scenarios can be learned any more.
    AllScenariosKnown,
    Progress {
        requests: Vec<Request>,
        facts: FactStore,
        state: State,
    },
}

pub trait Checker: Send + Sync {
    /// Seed facts for `request` from checks that need no data. Never fails; a check that
    /// cannot answer leaves its fact unbound.
    fn strict_check(
        &self,
        user: &Value,
        request: &Request,
        facts: &FactStore,
        strict_access: bool,
    ) -> (Request, FactStore);

    /// Resolve unknown facts referenced by `scenarios`, fetching data when nothing can be
    /// resolved from what is already loaded.
    fn run_checks(
        &self,
        scenarios: &[Scenario],
        user: &Value,
        requests: &[Request],
        facts: &FactStore,
        state: &State,
        strict_access: bool,
    ) -> Result<CheckRound, CheckError>;
}

/// Checker driven by the rule lists of the requests and a [`CheckRegistry`].
#[derive(Clone)]
pub struct RuleChecker {
    registry: CheckRegistry,
    fetcher: Arc<dyn Fetcher>,
}

impl RuleChecker {
    pub fn new(registry: CheckRegistry, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { registry, fetcher }
    }

    pub fn builtin(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::new(CheckRegistry::builtin(), fetcher)
    }

    fn lookup(&self, request: &Request, rule: &Rule) -> Result<&dyn Check, CheckError> {
        self.registry
            .get(&rule.check)
            .ok_or_else(|| CheckError::UnknownCheck {
                request: request.name.clone(),
                check: rule.check.clone(),
            })
    }

    /// Resolve one fact from the data already at hand. `None` means its request's data
    /// must be fetched first.
    fn resolve(
        &self,
        user: &Value,
        request: &Request,
        rule: &Rule,
        state: &State,
        strict_access: bool,
    ) -> Result<Option<FactValue>, CheckError> {
        let check = self.lookup(request, rule)?;

        if !check.has_deep_check() || request.strict_check_only {
            let value = match check.strict_check(user, request, &rule.config)? {
                StrictOutcome::Known(b) => FactValue::from(b),
                StrictOutcome::Irrelevant => FactValue::Irrelevant,
                StrictOutcome::Unknown => FactValue::Unknowable,
            };
            return Ok(Some(value));
        }

        if let Some(data) = self
            .fetcher
            .fetched(state, request)
            .then(|| request.data(state))
            .flatten()
        {
            return check.check(user, request, &rule.config, data).map(Some);
        }

        if strict_access {
            Ok(None)
        } else {
            Ok(Some(FactValue::Unknowable))
        }
    }

    /// Requests to fetch this round so the data `blocked` needs gets closer to loaded.
    ///
    /// A blocked request whose dependencies are met is fetched directly. Otherwise the
    /// requests owning its missing state keys are walked, transitively, until one is
    /// found whose own dependencies are met.
    fn fetch_plan<'r>(
        &self,
        blocked: &[&'r Request],
        requests: &'r [Request],
        state: &State,
    ) -> Vec<&'r Request> {
        let mut plan: Vec<&'r Request> = Vec::new();
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut pending: Vec<&'r Request> = blocked.iter().rev().copied().collect();

        while let Some(request) = pending.pop() {
            if !visited.insert(request.name.as_str()) || self.fetcher.fetched(state, request) {
                continue;
            }
            if self.fetcher.dependencies_met(state, request) {
                plan.push(request);
                continue;
            }
            for key in request.dependencies.iter().filter(|k| !state.contains(k)) {
                match requests.iter().find(|r| r.state_key == *key) {
                    Some(owner) => pending.push(owner),
                    None => debug!(request = %request.name, %key, "no request provides dependency"),
                }
            }
        }
        plan
    }
}

impl Checker for RuleChecker {
    fn strict_check(
        &self,
        user: &Value,
        request: &Request,
        facts: &FactStore,
        strict_access: bool,
    ) -> (Request, FactStore) {
        let mut facts = facts.clone();

        for rule in &request.rules {
            let id = rule.check_id(&request.name);
            if facts.contains(&id) {
                continue;
            }
            let check = match self.lookup(request, rule) {
                Ok(check) => check,
                Err(err) => {
                    warn!(%err, "skipping strict check");
                    continue;
                }
            };
            let value = match check.strict_check(user, request, &rule.config) {
                Ok(StrictOutcome::Known(b)) => FactValue::from(b),
                Ok(StrictOutcome::Irrelevant) => FactValue::Irrelevant,
                Ok(StrictOutcome::Unknown)
                    if (request.strict_check_only || !strict_access)
                        && !check.has_deep_check() =>
                {
                    FactValue::Unknowable
                }
                Ok(StrictOutcome::Unknown) => continue,
                Err(err) => {
                    warn!(%err, "strict check failed; leaving fact unknown");
                    continue;
                }
            };
            if let Err(err) = facts.bind(id, value) {
                warn!(%err, "strict check disagreed with a bound fact");
            }
        }

        (request.clone(), facts)
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
        let owners: BTreeMap<CheckId, (&Request, &Rule)> = requests
            .iter()
            .flat_map(|request| {
                request
                    .rules
                    .iter()
                    .map(move |rule| (rule.check_id(&request.name), (request, rule)))
            })
            .collect();

        let unknown: BTreeSet<&CheckId> = scenarios
            .iter()
            .flat_map(|scenario| scenario.keys())
            .filter(|id| !id.is_sentinel() && !facts.contains(id))
            .collect();
        if unknown.is_empty() {
            return Ok(CheckRound::AllScenariosKnown);
        }

        let mut next = facts.clone();
        let mut resolved = 0usize;
        let mut needs_data: Vec<&Request> = Vec::new();

        for id in unknown {
            let Some(&(request, rule)) = owners.get(id) else {
                debug!(fact = %id, "no request owns this fact");
                continue;
            };
            match self.resolve(user, request, rule, state, strict_access)? {
                Some(value) => {
                    debug!(fact = %id, ?value, "resolved");
                    next.bind(id.clone(), value)?;
                    resolved += 1;
                }
                None => {
                    if !needs_data.iter().any(|r| r.name == request.name) {
                        needs_data.push(request);
                    }
                }
            }
        }

        if resolved > 0 {
            return Ok(CheckRound::Progress {
                requests: requests.to_vec(),
                facts: next,
                state: state.clone(),
            });
        }

        let mut next_state = state.clone();
        let mut fetched_any = false;
        for request in self.fetch_plan(&needs_data, requests, state) {
            if self.fetcher.fetched(&next_state, request) {
                continue;
            }
            next_state = self.fetcher.fetch(&next_state, request)?;
            fetched_any = true;
        }

        if !fetched_any {
            return Ok(CheckRound::AllScenariosKnown);
        }
        Ok(CheckRound::Progress {
            requests: requests.to_vec(),
            facts: next,
            state: next_state,
        })
    }
}

impl std::fmt::Debug for RuleChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleChecker")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
