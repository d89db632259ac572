//! Cross-checks between the base solvers on small random relations.
//!
//! These tests verify that:
//! - Every solver returns FD-consistent relations
//! - The vertex-cover approximation never beats the exact optimum and keeps a maximal set
//! - The exact solver never loses to a rounding solver

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rsrepair_relation::{Fd, FdSet, Relation};
use rsrepair_solver::{
    BaseSolver, ExactSolver, LpRoundingSolver, RoundingPolicy, VertexCoverSolver,
};

fn build(rows: &[(u8, u8, u8)]) -> Relation {
    let records = rows
        .iter()
        .map(|&(a, b, s)| vec![format!("a{a}"), format!("b{b}"), format!("s{s}")])
        .collect();
    Relation::from_records(
        vec!["A".to_string(), "B".to_string(), "S".to_string()],
        "S",
        records,
    )
    .unwrap()
}

fn best(solver: &dyn BaseSolver, rel: &Relation, fds: &FdSet, seed: u64) -> usize {
    let mut rng = StdRng::seed_from_u64(seed);
    let map = solver.solve(rel, fds, None, &mut rng).unwrap();
    for r in map.relations() {
        assert!(fds.is_consistent(r).unwrap(), "{} broke an FD", solver.name());
    }
    map.relations().iter().map(Relation::len).max().unwrap_or(0)
}

fn arb_rows() -> impl Strategy<Value = Vec<(u8, u8, u8)>> {
    prop::collection::vec((0u8..3, 0u8..3, 0u8..2), 1..9)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn vertex_cover_is_bounded_by_exact(rows in arb_rows(), seed in any::<u64>()) {
        let rel = build(&rows);
        let fds = FdSet::new(vec![Fd::new(["A"], "B"), Fd::new(["B"], "A")]);
        let opt = best(&ExactSolver, &rel, &fds, seed);
        let approx = best(&VertexCoverSolver, &rel, &fds, seed);
        prop_assert!(approx <= opt);
        prop_assert!(opt == 0 || approx > 0);
    }

    #[test]
    fn exact_dominates_rounding(rows in arb_rows()) {
        let rel = build(&rows);
        let fds = FdSet::new(vec![Fd::new(["A"], "B")]);
        let opt = best(&ExactSolver, &rel, &fds, 7);
        for policy in [RoundingPolicy::Greedy, RoundingPolicy::Stratified] {
            let rounded = best(&LpRoundingSolver::new(policy), &rel, &fds, 7);
            prop_assert!(rounded <= opt);
        }
    }
}

#[test]
fn two_approx_scenario_keeps_two_rows() {
    let rel = build(&[(0, 1, 0), (0, 2, 0), (1, 3, 0)]);
    let fds = FdSet::new(vec![Fd::new(["A"], "B")]);
    for seed in 0..8 {
        assert!(best(&VertexCoverSolver, &rel, &fds, seed) >= 2);
    }
}
