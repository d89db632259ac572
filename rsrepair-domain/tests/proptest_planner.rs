//! Property-based tests for the decomposition planner.
//!
//! These tests verify that:
//! - Every relation the planner returns is FD-consistent, whichever branch produced it
//! - Planner frontiers never hold two keys where one dominates the other
//! - With a representative constraint and an exact fallback, every result qualifies
//! - The same seed reproduces the same result

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rsrepair_domain::{MatchingMethod, Planner, PlannerConfig};
use rsrepair_relation::{Fd, FdSet, Relation, RepairMap};
use rsrepair_solver::ExactSolver;
use rsrepair_types::{Fraction, RepresentativeConstraint};

fn build(rows: &[(u8, u8, u8, bool)]) -> Relation {
    let records = rows
        .iter()
        .map(|&(a, b, c, f)| {
            vec![
                format!("a{a}"),
                format!("b{b}"),
                format!("c{c}"),
                if f { "f" } else { "m" }.to_string(),
            ]
        })
        .collect();
    Relation::from_records(
        vec!["A".into(), "B".into(), "C".into(), "S".into()],
        "S",
        records,
    )
    .unwrap()
}

fn arb_rows() -> impl Strategy<Value = Vec<(u8, u8, u8, bool)>> {
    prop::collection::vec((0u8..3, 0u8..3, 0u8..2, any::<bool>()), 1..10)
}

/// One FD set per decomposition branch, the last one needing the fallback.
fn arb_fds() -> impl Strategy<Value = FdSet> {
    prop_oneof![
        Just(FdSet::new(vec![Fd::new(["A"], "B"), Fd::new(["A", "C"], "B")])),
        Just(FdSet::new(vec![Fd::new(Vec::<String>::new(), "C")])),
        Just(FdSet::new(vec![Fd::new(["A"], "B"), Fd::new(["B"], "A")])),
        Just(FdSet::new(vec![Fd::new(["A"], "B"), Fd::new(["B"], "C")])),
    ]
}

fn arb_matching() -> impl Strategy<Value = MatchingMethod> {
    prop_oneof![
        Just(MatchingMethod::FractionalElimination),
        Just(MatchingMethod::Ilp)
    ]
}

fn planner(matching: MatchingMethod) -> Planner {
    Planner::new(PlannerConfig { matching }).with_fallback(Box::new(ExactSolver))
}

fn frontier_ok(map: &RepairMap) -> bool {
    let keys: Vec<_> = map.keys().collect();
    keys.iter()
        .enumerate()
        .all(|(i, a)| keys[i + 1..].iter().all(|b| !a.dominates(b) && !b.dominates(a)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn planner_output_is_consistent(
        rows in arb_rows(),
        fds in arb_fds(),
        matching in arb_matching(),
    ) {
        let rel = build(&rows);
        let mut rng = StdRng::seed_from_u64(42);
        let map = planner(matching).plan(&rel, &fds, None, &mut rng).unwrap();
        prop_assert!(!map.is_empty());
        prop_assert!(frontier_ok(&map));
        for r in map.relations() {
            prop_assert!(fds.is_consistent(r).unwrap(), "{fds} broken by {} rows", r.len());
            prop_assert!(r.len() <= rel.len());
        }
    }

    #[test]
    fn exact_fallback_respects_the_constraint(rows in arb_rows()) {
        let rel = build(&rows);
        let fds = FdSet::new(vec![Fd::new(["A"], "B"), Fd::new(["B"], "C")]);
        let fractions: Vec<Fraction> = rel
            .schema()
            .labels()
            .iter()
            .map(|l| if l == "f" { Fraction::new(1, 3).unwrap() } else { Fraction::ZERO })
            .collect();
        let rc = RepresentativeConstraint::new(rel.schema().labels().to_vec(), fractions).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let map = planner(MatchingMethod::default())
            .plan(&rel, &fds, Some(&rc), &mut rng)
            .unwrap();
        for r in map.relations() {
            prop_assert!(fds.is_consistent(r).unwrap());
            prop_assert!(rc.qualify(r.distribution()));
        }
    }

    #[test]
    fn same_seed_same_result(rows in arb_rows(), fds in arb_fds()) {
        let rel = build(&rows);
        let run = || {
            let mut rng = StdRng::seed_from_u64(3);
            planner(MatchingMethod::default())
                .plan(&rel, &fds, None, &mut rng)
                .unwrap()
                .into_relations()
        };
        prop_assert_eq!(run(), run());
    }
}
