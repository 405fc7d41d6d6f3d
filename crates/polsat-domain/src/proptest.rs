//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Scenario minimization
//! - Fact store monotonicity
//! - Solver soundness against the rule chains
//! - End-to-end decisions for fully strict policies

use crate::checker::RuleChecker;
use crate::error::AuthorizeError;
use crate::fetch::StaticFetcher;
use crate::model::{FactStore, Request, Rule, RuleKind, Scenario};
use crate::policy::AuthorizeOptions;
use crate::rules::{Outcome, evaluate_rules};
use crate::scenarios::remove_irrelevant_clauses;
use crate::solver::{ExhaustiveSolver, SatSolver};
use polsat_types::{CheckId, FactValue, Requirement};
use proptest::prelude::*;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// Strategies
// ============================================================================

fn arb_requirement() -> impl Strategy<Value = Requirement> {
    prop_oneof![
        4 => Just(Requirement::True),
        4 => Just(Requirement::False),
        1 => Just(Requirement::Irrelevant),
    ]
}

fn arb_scenario() -> impl Strategy<Value = Scenario> {
    prop::collection::btree_map(
        (0u8..4).prop_map(|i| CheckId::new(format!("r/f{i}"))),
        arb_requirement(),
        0..4,
    )
}

fn arb_rule_kind() -> impl Strategy<Value = RuleKind> {
    prop_oneof![
        Just(RuleKind::AuthorizeIf),
        Just(RuleKind::ForbidIf),
        Just(RuleKind::AuthorizeUnless),
        Just(RuleKind::ForbidUnless),
    ]
}

/// Rule chains over a small pool of abstract checks `c0..c3`.
fn arb_abstract_requests() -> impl Strategy<Value = Vec<Request>> {
    let rule = (arb_rule_kind(), 0u8..4).prop_map(|(kind, c)| Rule::new(kind, &format!("c{c}")));
    prop::collection::vec(prop::collection::vec(rule, 1..4), 1..3).prop_map(|chains| {
        chains
            .into_iter()
            .enumerate()
            .map(|(i, rules)| Request::new(&format!("r{i}"), rules))
            .collect()
    })
}

/// Rule chains over the strict built-in checks.
fn arb_strict_requests() -> impl Strategy<Value = Vec<Request>> {
    let check = prop_oneof![
        Just(Rule::new(RuleKind::AuthorizeIf, "always")),
        Just(Rule::new(RuleKind::AuthorizeIf, "never")),
        Just(Rule::new(RuleKind::AuthorizeIf, "actor_present")),
        Just(
            Rule::new(RuleKind::AuthorizeIf, "actor_attribute_equals")
                .with_config(json!({"attribute": "role", "value": "admin"}))
        ),
    ];
    let rule = (arb_rule_kind(), check).prop_map(|(kind, mut rule)| {
        rule.kind = kind;
        rule
    });
    prop::collection::vec(prop::collection::vec(rule, 1..4), 1..3).prop_map(|chains| {
        chains
            .into_iter()
            .enumerate()
            .map(|(i, rules)| Request::new(&format!("r{i}"), rules))
            .collect()
    })
}

fn arb_user() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(json!({"id": 1, "role": "admin"})),
        Just(json!({"id": 2, "role": "guest"})),
    ]
}

fn strict_value(rule: &Rule, user: &Value) -> bool {
    match rule.check.as_str() {
        "always" => true,
        "never" => false,
        "actor_present" => !user.is_null(),
        "actor_attribute_equals" => user.get("role") == Some(&json!("admin")),
        other => panic!("unexpected check {other}"),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn minimization_is_idempotent(scenarios in prop::collection::vec(arb_scenario(), 0..6)) {
        let once = remove_irrelevant_clauses(scenarios);
        let twice = remove_irrelevant_clauses(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn minimization_never_grows_a_scenario(scenarios in prop::collection::vec(arb_scenario(), 1..6)) {
        let widest = scenarios.iter().map(BTreeMap::len).max().unwrap_or(0);
        for scenario in remove_irrelevant_clauses(scenarios) {
            prop_assert!(scenario.len() <= widest);
            prop_assert!(scenario.values().all(|r| *r != Requirement::Irrelevant));
        }
    }

    #[test]
    fn successful_binds_never_violate_earlier_facts(
        binds in prop::collection::vec(
            (0u8..4, prop_oneof![
                Just(FactValue::True),
                Just(FactValue::False),
                Just(FactValue::Irrelevant),
                Just(FactValue::Unknowable),
            ]),
            0..12,
        )
    ) {
        let mut facts = FactStore::new();
        for (key, value) in binds {
            let before = facts.clone();
            if facts.bind(CheckId::new(format!("r/f{key}")), value).is_ok() {
                prop_assert_eq!(before.first_violation_in(&facts), None);
            } else {
                prop_assert_eq!(&before, &facts);
            }
        }
    }

    #[test]
    fn solver_scenarios_authorize_every_request(
        requests in arb_abstract_requests(),
        known in prop::collection::btree_map(0u8..4, any::<bool>(), 0..3),
    ) {
        let mut facts = FactStore::new();
        for request in &requests {
            for (c, value) in &known {
                let id = CheckId::new(format!("{}/c{c}", request.name));
                facts.bind(id, FactValue::from(*value)).unwrap();
            }
        }

        if let Ok(scenario) = ExhaustiveSolver::default().solve(&requests, &facts, &[], None) {
            for (id, required) in &scenario {
                if let Some(bound) = facts.get(id).and_then(FactValue::as_bool) {
                    prop_assert_eq!(Some(bound), required.as_bool());
                }
            }
            for request in &requests {
                let outcome = evaluate_rules(request, |id| scenario.get(id).and_then(|r| r.as_bool()));
                prop_assert_eq!(outcome, Some(Outcome::Authorized));
            }
        }
    }

    #[test]
    fn strict_policies_decide_like_direct_evaluation(
        requests in arb_strict_requests(),
        user in arb_user(),
    ) {
        let fetcher = Arc::new(StaticFetcher::default());
        let checker = RuleChecker::builtin(fetcher.clone());
        let solver = ExhaustiveSolver::default();

        let expected = requests.iter().all(|request| {
            let values: BTreeMap<CheckId, bool> = request
                .rules
                .iter()
                .map(|rule| (rule.check_id(&request.name), strict_value(rule, &user)))
                .collect();
            evaluate_rules(request, |id| values.get(id).copied()) == Some(Outcome::Authorized)
        });

        let result = crate::authorize(
            &solver,
            &checker,
            &*fetcher,
            &user,
            &requests,
            &AuthorizeOptions::default(),
        );
        match result {
            Ok(_) => prop_assert!(expected),
            Err(AuthorizeError::Forbidden(_)) => prop_assert!(!expected),
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}
