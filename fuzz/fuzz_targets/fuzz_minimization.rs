//! Fuzz target for scenario minimization.
//!
//! Goal: `remove_irrelevant_clauses` reaches a fixed point, never grows a scenario,
//! and never keeps an `Irrelevant` clause.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_minimization
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use polsat_domain::model::Scenario;
use polsat_domain::scenarios::remove_irrelevant_clauses;
use polsat_types::{CheckId, Requirement};

#[derive(Arbitrary, Debug)]
struct Clause {
    fact: u8,
    requirement: u8,
}

fn to_scenario(clauses: &[Clause]) -> Scenario {
    clauses
        .iter()
        .map(|c| {
            let requirement = match c.requirement % 3 {
                0 => Requirement::True,
                1 => Requirement::False,
                _ => Requirement::Irrelevant,
            };
            (CheckId::new(format!("r/f{}", c.fact % 6)), requirement)
        })
        .collect()
}

fuzz_target!(|input: Vec<Vec<Clause>>| {
    if input.len() > 16 || input.iter().any(|s| s.len() > 8) {
        return;
    }

    let scenarios: Vec<Scenario> = input.iter().map(|c| to_scenario(c)).collect();
    let widest = scenarios.iter().map(Scenario::len).max().unwrap_or(0);

    let once = remove_irrelevant_clauses(scenarios);
    for scenario in &once {
        assert!(scenario.len() <= widest);
        assert!(scenario.values().all(|r| *r != Requirement::Irrelevant));
    }
    assert_eq!(remove_irrelevant_clauses(once.clone()), once);
});
