use crate::lp::solve;
use microlp::{ComparisonOp, OptimizationDirection, Problem};
use rsrepair_types::{ColorDistribution, RepairResult, RepresentativeConstraint};
use std::collections::BTreeMap;
use tracing::debug;

/// One candidate pairing handed to the matching program.
#[derive(Debug, Clone, Copy)]
pub struct LpEdge<'a> {
    pub left: usize,
    pub right: usize,
    pub distribution: &'a ColorDistribution,
}

const SOLVER: &str = "matching-lp";

/// Solve the bipartite matching program over `edges` and return one weight per edge.
///
/// Every left and right node carries at most unit weight. With a constraint that requires some
/// category, the program maximizes the shared slack `s` with `s * f_i <= sum(x_e * d_e[i])` for
/// each required category `i`, plus a tiny size term that breaks ties toward larger selections.
/// Without one it maximizes the total selected rows. `integral` makes every edge binary.
pub fn solve_matching_lp(
    edges: &[LpEdge<'_>],
    rc: Option<&RepresentativeConstraint>,
    integral: bool,
) -> RepairResult<Vec<f64>> {
    if edges.is_empty() {
        return Ok(Vec::new());
    }

    let required: Vec<(usize, f64)> = rc
        .map(|rc| {
            (0..rc.categories())
                .filter(|&i| !rc.fraction(i).is_zero())
                .map(|i| (i, rc.fraction(i).as_f64()))
                .collect()
        })
        .unwrap_or_default();
    let total_rows: f64 = edges.iter().map(|e| e.distribution.total() as f64).sum();

    let mut problem = Problem::new(OptimizationDirection::Maximize);
    let size_weight = if required.is_empty() {
        1.0
    } else {
        1e-6 / (1.0 + total_rows)
    };
    let x: Vec<_> = edges
        .iter()
        .map(|e| {
            let obj = size_weight * e.distribution.total() as f64;
            if integral {
                problem.add_binary_var(obj)
            } else {
                problem.add_var(obj, (0.0, 1.0))
            }
        })
        .collect();

    let mut by_left: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut by_right: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, e) in edges.iter().enumerate() {
        by_left.entry(e.left).or_default().push(i);
        by_right.entry(e.right).or_default().push(i);
    }
    for group in by_left.values().chain(by_right.values()) {
        problem.add_constraint(
            group.iter().map(|&i| (x[i], 1.0)),
            ComparisonOp::Le,
            1.0,
        );
    }

    if !required.is_empty() {
        // s can never exceed the bottleneck of selecting every edge at once.
        let bound = required
            .iter()
            .map(|&(i, f)| {
                edges
                    .iter()
                    .map(|e| e.distribution.count(i) as f64)
                    .sum::<f64>()
                    / f
            })
            .fold(f64::INFINITY, f64::min)
            + 1.0;
        let s = problem.add_var(1.0, (0.0, bound));
        for &(category, f) in &required {
            let mut expr = vec![(s, f)];
            expr.extend(
                edges
                    .iter()
                    .zip(&x)
                    .filter(|(e, _)| e.distribution.count(category) > 0)
                    .map(|(e, &var)| (var, -(e.distribution.count(category) as f64))),
            );
            problem.add_constraint(expr, ComparisonOp::Le, 0.0);
        }
    }

    debug!(
        edges = edges.len(),
        left = by_left.len(),
        right = by_right.len(),
        required = required.len(),
        integral,
        "solving matching program"
    );
    let solution = solve(&problem, SOLVER)?;
    Ok(x.iter().map(|&v| solution[v]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsrepair_types::Fraction;

    fn d(counts: &[u64]) -> ColorDistribution {
        ColorDistribution::from_counts(counts.to_vec())
    }

    fn rc(fractions: &[(u64, u64)]) -> RepresentativeConstraint {
        RepresentativeConstraint::new(
            (0..fractions.len()).map(|i| format!("c{i}")).collect(),
            fractions
                .iter()
                .map(|&(n, dd)| Fraction::new(n, dd).unwrap())
                .collect(),
        )
        .unwrap()
    }

    fn degrees_ok(edges: &[LpEdge<'_>], w: &[f64]) -> bool {
        let mut left: BTreeMap<usize, f64> = BTreeMap::new();
        let mut right: BTreeMap<usize, f64> = BTreeMap::new();
        for (e, w) in edges.iter().zip(w) {
            *left.entry(e.left).or_default() += w;
            *right.entry(e.right).or_default() += w;
        }
        left.values().chain(right.values()).all(|&s| s <= 1.0 + 1e-6)
    }

    #[test]
    fn unconstrained_prefers_larger_edges() {
        let big = d(&[5, 0]);
        let small = d(&[1, 0]);
        let edges = [
            LpEdge { left: 0, right: 0, distribution: &big },
            LpEdge { left: 0, right: 1, distribution: &small },
        ];
        let w = solve_matching_lp(&edges, None, true).unwrap();
        assert!((w[0] - 1.0).abs() < 1e-6);
        assert!(w[1].abs() < 1e-6);
    }

    #[test]
    fn constrained_program_respects_degrees() {
        let a = d(&[3, 0]);
        let b = d(&[0, 2]);
        let c = d(&[1, 1]);
        let edges = [
            LpEdge { left: 0, right: 0, distribution: &a },
            LpEdge { left: 1, right: 0, distribution: &b },
            LpEdge { left: 1, right: 1, distribution: &c },
        ];
        let rc = rc(&[(1, 3), (1, 3)]);
        for integral in [false, true] {
            let w = solve_matching_lp(&edges, Some(&rc), integral).unwrap();
            assert_eq!(w.len(), 3);
            assert!(degrees_ok(&edges, &w));
        }
    }

    #[test]
    fn no_edges_is_trivially_solved() {
        assert!(solve_matching_lp(&[], None, false).unwrap().is_empty());
    }
}
