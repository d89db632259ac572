use crate::conflict::ConflictGraph;
use microlp::{ComparisonOp, OptimizationDirection, Problem, Solution};
use rsrepair_relation::Relation;
use rsrepair_types::{RepairError, RepairResult, RepresentativeConstraint};
use tracing::debug;

/// Values closer than this to 0 or 1 are treated as integral.
pub const EPS: f64 = 1e-8;

pub(crate) fn solve(problem: &Problem, solver: &str) -> RepairResult<Solution> {
    problem
        .solve()
        .map_err(|e| RepairError::infeasible(solver, e.to_string()))
}

/// Maximize the number of kept rows subject to pairwise conflict constraints and, when given,
/// the proportional share of every constrained category.
///
/// Returns one value per row position, binary when `integral` is set.
pub(crate) fn row_program(
    rel: &Relation,
    graph: &ConflictGraph,
    rc: Option<&RepresentativeConstraint>,
    integral: bool,
    solver: &str,
) -> RepairResult<Vec<f64>> {
    if rel.is_empty() {
        return Ok(Vec::new());
    }

    let mut problem = Problem::new(OptimizationDirection::Maximize);
    let x: Vec<_> = (0..rel.len())
        .map(|_| {
            if integral {
                problem.add_binary_var(1.0)
            } else {
                problem.add_var(1.0, (0.0, 1.0))
            }
        })
        .collect();

    for &(a, b) in graph.edges() {
        problem.add_constraint([(x[a], 1.0), (x[b], 1.0)], ComparisonOp::Le, 1.0);
    }

    let mut share_constraints = 0usize;
    if let Some(rc) = rc {
        for category in 0..rel.categories() {
            let f = rc.fraction(category);
            if f.is_zero() {
                continue;
            }
            let f = f.as_f64();
            let expr: Vec<_> = rel
                .rows()
                .iter()
                .zip(&x)
                .map(|(row, &var)| {
                    let coeff = if row.category == category { 1.0 - f } else { -f };
                    (var, coeff)
                })
                .collect();
            problem.add_constraint(expr, ComparisonOp::Ge, 0.0);
            share_constraints += 1;
        }
    }

    debug!(
        solver,
        rows = rel.len(),
        conflicts = graph.edges().len(),
        share_constraints,
        integral,
        "solving row program"
    );
    let solution = solve(&problem, solver)?;
    Ok(x.iter().map(|&v| solution[v]).collect())
}
