//! Scenario search.
//!
//! [`SatSolver`] is the seam to a real SAT backend. [`ExhaustiveSolver`] is the reference
//! implementation: it walks assignments of the free facts directly against the rule chains,
//! which keeps it exact for the small fact counts a single authorization decision involves.

use crate::model::{FactStore, Request, RowIdentity, Scenario};
use crate::policy::SolverLimits;
use crate::rules::{Outcome, evaluate_rules};
use polsat_types::{CheckId, FactValue, Requirement};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Default cap on free facts for [`ExhaustiveSolver`].
pub const DEFAULT_MAX_VARIABLES: usize = 20;

/// Largest free fact count [`ExhaustiveSolver`] can enumerate with a 64-bit mask.
pub const MAX_SUPPORTED_VARIABLES: usize = 63;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("no assignment authorizes every request")]
    Unsatisfiable,
    #[error("{count} free facts exceed the solver limit of {limit}")]
    TooManyVariables { count: usize, limit: usize },
}

pub trait SatSolver: Send + Sync {
    /// Find one scenario consistent with `facts` that authorizes every request and
    /// contradicts every scenario in `negations`.
    fn solve(
        &self,
        requests: &[Request],
        facts: &FactStore,
        negations: &[Scenario],
        row_identities: Option<&[RowIdentity]>,
    ) -> Result<Scenario, SolveError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Var {
    Fixed(bool),
    Free { irrelevant: bool },
    Unusable,
}

#[derive(Clone, Debug)]
pub struct ExhaustiveSolver {
    max_variables: usize,
}

impl Default for ExhaustiveSolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VARIABLES)
    }
}

impl ExhaustiveSolver {
    pub fn new(max_variables: usize) -> Self {
        Self { max_variables }
    }

    pub fn with_limits(limits: SolverLimits) -> Self {
        Self::new(limits.max_variables)
    }

    fn classify(
        requests: &[Request],
        facts: &FactStore,
        negations: &[Scenario],
    ) -> BTreeMap<CheckId, Var> {
        let referenced: BTreeSet<CheckId> = requests
            .iter()
            .flat_map(Request::check_ids)
            .chain(negations.iter().flat_map(|n| n.keys().cloned()))
            .filter(|id| !id.is_sentinel())
            .collect();

        referenced
            .into_iter()
            .map(|id| {
                let var = match facts.get(&id) {
                    Some(FactValue::True) => Var::Fixed(true),
                    Some(FactValue::False) => Var::Fixed(false),
                    Some(FactValue::Irrelevant) => Var::Free { irrelevant: true },
                    Some(FactValue::Unknowable) => Var::Unusable,
                    None => Var::Free { irrelevant: false },
                };
                (id, var)
            })
            .collect()
    }
}

impl SatSolver for ExhaustiveSolver {
    fn solve(
        &self,
        requests: &[Request],
        facts: &FactStore,
        negations: &[Scenario],
        row_identities: Option<&[RowIdentity]>,
    ) -> Result<Scenario, SolveError> {
        let vars = Self::classify(requests, facts, negations);
        let free: Vec<&CheckId> = vars
            .iter()
            .filter(|(_, v)| matches!(v, Var::Free { .. }))
            .map(|(id, _)| id)
            .collect();

        if free.len() > self.max_variables {
            return Err(SolveError::TooManyVariables {
                count: free.len(),
                limit: self.max_variables,
            });
        }
        let Some(end) = u32::try_from(free.len())
            .ok()
            .filter(|&n| n as usize <= MAX_SUPPORTED_VARIABLES)
            .and_then(|n| 1u64.checked_shl(n))
        else {
            return Err(SolveError::TooManyVariables {
                count: free.len(),
                limit: MAX_SUPPORTED_VARIABLES,
            });
        };
        if let Some(rows) = row_identities {
            debug!(rows = rows.len(), "solving with row identities in scope");
        }

        for mask in 0u64..end {
            let value_of = |id: &CheckId| -> Option<bool> {
                match vars.get(id)? {
                    Var::Fixed(b) => Some(*b),
                    Var::Unusable => None,
                    Var::Free { .. } => {
                        let bit = free.iter().position(|f| *f == id)?;
                        Some(mask & (1 << bit) != 0)
                    }
                }
            };

            if let Some(assignment) = satisfying_reads(requests, negations, &value_of) {
                let scenario = assignment
                    .into_iter()
                    .map(|(id, value)| {
                        let requirement = match vars.get(&id) {
                            Some(Var::Free { irrelevant: true }) => Requirement::Irrelevant,
                            _ => Requirement::from(value),
                        };
                        (id, requirement)
                    })
                    .collect();
                return Ok(scenario);
            }
        }

        Err(SolveError::Unsatisfiable)
    }
}

/// The facts an assignment relies on, when it authorizes every request and escapes every
/// negation.
fn satisfying_reads<F>(
    requests: &[Request],
    negations: &[Scenario],
    value_of: &F,
) -> Option<BTreeMap<CheckId, bool>>
where
    F: Fn(&CheckId) -> Option<bool>,
{
    let mut reads = BTreeMap::new();

    for request in requests {
        let outcome = evaluate_rules(request, |id| {
            let value = value_of(id)?;
            reads.insert(id.clone(), value);
            Some(value)
        });
        if outcome != Some(Outcome::Authorized) {
            return None;
        }
    }

    for negation in negations {
        let (id, value) = negation.iter().find_map(|(id, required)| {
            let required = required.as_bool()?;
            let value = value_of(id)?;
            (value != required).then(|| (id.clone(), value))
        })?;
        reads.insert(id, value);
    }

    Some(reads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rule;

    fn req(name: &str, rules: Vec<Rule>) -> Request {
        Request::new(name, rules)
    }

    fn id(s: &str) -> CheckId {
        CheckId::new(s)
    }

    #[test]
    fn returns_only_the_facts_it_read() {
        let requests = vec![req(
            "r",
            vec![Rule::authorize_if("a"), Rule::authorize_if("b")],
        )];
        let scenario = ExhaustiveSolver::default()
            .solve(&requests, &FactStore::new(), &[], None)
            .expect("satisfiable");
        // mask 0 sets everything false; the first authorizing mask sets `a` true.
        let expected: Scenario = [(id("r/a"), Requirement::True)].into_iter().collect();
        assert_eq!(scenario, expected);
    }

    #[test]
    fn known_facts_are_fixed() {
        let requests = vec![req("r", vec![Rule::authorize_if("a")])];
        let mut facts = FactStore::new();
        facts.bind(id("r/a"), FactValue::False).unwrap();
        assert_eq!(
            ExhaustiveSolver::default().solve(&requests, &facts, &[], None),
            Err(SolveError::Unsatisfiable)
        );
    }

    #[test]
    fn negation_forces_a_different_scenario() {
        let requests = vec![req(
            "r",
            vec![Rule::authorize_if("a"), Rule::authorize_if("b")],
        )];
        let solver = ExhaustiveSolver::default();
        let first = solver
            .solve(&requests, &FactStore::new(), &[], None)
            .unwrap();
        let second = solver
            .solve(&requests, &FactStore::new(), &[first.clone()], None)
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(second.get(&id("r/a")), Some(&Requirement::False));
        assert_eq!(second.get(&id("r/b")), Some(&Requirement::True));

        assert_eq!(
            solver.solve(&requests, &FactStore::new(), &[first, second], None),
            Err(SolveError::Unsatisfiable)
        );
    }

    #[test]
    fn unknowable_facts_are_never_relied_on() {
        let requests = vec![req(
            "r",
            vec![Rule::authorize_if("a"), Rule::authorize_if("b")],
        )];
        let mut facts = FactStore::new();
        facts.bind(id("r/a"), FactValue::Unknowable).unwrap();
        assert_eq!(
            ExhaustiveSolver::default().solve(&requests, &facts, &[], None),
            Err(SolveError::Unsatisfiable)
        );
    }

    #[test]
    fn irrelevant_facts_are_marked_in_the_scenario() {
        let requests = vec![req("r", vec![Rule::forbid_if("a"), Rule::authorize_if("b")])];
        let mut facts = FactStore::new();
        facts.bind(id("r/a"), FactValue::Irrelevant).unwrap();
        let scenario = ExhaustiveSolver::default()
            .solve(&requests, &facts, &[], None)
            .unwrap();
        assert_eq!(scenario.get(&id("r/a")), Some(&Requirement::Irrelevant));
        assert_eq!(scenario.get(&id("r/b")), Some(&Requirement::True));
    }

    #[test]
    fn all_requests_must_be_authorized() {
        let requests = vec![
            req("r1", vec![Rule::authorize_if("a")]),
            req("r2", vec![Rule::forbid_if("b"), Rule::authorize_if("c")]),
        ];
        let scenario = ExhaustiveSolver::default()
            .solve(&requests, &FactStore::new(), &[], None)
            .unwrap();
        assert_eq!(scenario.get(&id("r1/a")), Some(&Requirement::True));
        assert_eq!(scenario.get(&id("r2/b")), Some(&Requirement::False));
        assert_eq!(scenario.get(&id("r2/c")), Some(&Requirement::True));
    }

    #[test]
    fn too_many_free_facts_is_an_error() {
        let rules = (0..4).map(|i| Rule::authorize_if(&format!("c{i}"))).collect();
        let requests = vec![req("r", rules)];
        assert_eq!(
            ExhaustiveSolver::new(3).solve(&requests, &FactStore::new(), &[], None),
            Err(SolveError::TooManyVariables { count: 4, limit: 3 })
        );
    }

    #[test]
    fn limit_above_the_mask_width_is_refused_not_overflowed() {
        let rules = (0..64).map(|i| Rule::authorize_if(&format!("c{i}"))).collect();
        let requests = vec![req("r", rules)];
        assert_eq!(
            ExhaustiveSolver::new(64).solve(&requests, &FactStore::new(), &[], None),
            Err(SolveError::TooManyVariables {
                count: 64,
                limit: MAX_SUPPORTED_VARIABLES
            })
        );
    }
}
