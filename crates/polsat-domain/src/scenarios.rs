//! Scenario minimization and evaluation against known facts.

use crate::model::{FactStore, Scenario};
use polsat_types::{CheckId, FactValue, Requirement};

/// How a scenario relates to the facts known so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioStatus {
    /// Every requirement is met by a known fact.
    Reality,
    /// Some requirement is contradicted.
    NotReality,
    /// No contradiction, but some requirements are still unknown.
    Maybe,
}

/// Evaluate `scenario` against `facts`.
///
/// Unknowns downgrade to `Maybe` without stopping the scan, so a later contradiction still
/// wins.
pub fn scenario_is_reality(scenario: &Scenario, facts: &FactStore) -> ScenarioStatus {
    let mut status = ScenarioStatus::Reality;

    for (fact, required) in scenario.iter().filter(|(fact, _)| !fact.is_sentinel()) {
        let Some(known) = facts.get(fact) else {
            status = ScenarioStatus::Maybe;
            continue;
        };
        match (known, required.as_bool()) {
            (FactValue::Irrelevant, _) | (_, None) => {}
            (FactValue::Unknowable, Some(_)) => return ScenarioStatus::NotReality,
            (FactValue::True | FactValue::False, Some(required)) => {
                if known.as_bool() != Some(required) {
                    return ScenarioStatus::NotReality;
                }
            }
        }
    }

    status
}

/// Strip facts that do not influence the outcome, to a fixed point.
///
/// A fact goes when it is marked `Irrelevant` in the scenario, or when another scenario in
/// the set is identical except for the opposite boolean at that fact.
pub fn remove_irrelevant_clauses(scenarios: Vec<Scenario>) -> Vec<Scenario> {
    let mut current = dedup(scenarios);

    loop {
        let next = dedup(
            current
                .iter()
                .map(|scenario| match unnecessary_fact(scenario, &current) {
                    Some(fact) => {
                        let mut reduced = scenario.clone();
                        reduced.remove(&fact);
                        reduced
                    }
                    None => scenario.clone(),
                })
                .collect(),
        );

        if next == current {
            return next;
        }
        current = next;
    }
}

fn unnecessary_fact(scenario: &Scenario, all: &[Scenario]) -> Option<CheckId> {
    scenario.iter().find_map(|(fact, value)| {
        let Some(value) = value.as_bool() else {
            return Some(fact.clone());
        };
        let opposite = Requirement::from(!value);
        all.iter()
            .any(|other| {
                other != scenario
                    && other.get(fact) == Some(&opposite)
                    && same_except(scenario, other, fact)
            })
            .then(|| fact.clone())
    })
}

fn same_except(a: &Scenario, b: &Scenario, fact: &CheckId) -> bool {
    a.len() == b.len()
        && a.iter()
            .filter(|(k, _)| *k != fact)
            .all(|(k, v)| b.get(k) == Some(v))
}

/// Order-preserving de-duplication.
pub fn dedup(scenarios: Vec<Scenario>) -> Vec<Scenario> {
    let mut out: Vec<Scenario> = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        if !out.contains(&scenario) {
            out.push(scenario);
        }
    }
    out
}
