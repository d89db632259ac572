//! Base solvers for sub-problems the planner cannot decompose.
//!
//! Responsibilities:
//! - Build the FD-violation graph of a relation.
//! - Solve the row program exactly (binary ILP) or by LP relaxation plus rounding.
//! - Remove conflicts without regard to representation (vertex-cover approximation).
//! - Solve the bipartite matching program the matching combiner rounds.
//!
//! All mathematical programs go through `microlp`. A solver failure surfaces as
//! `RepairError::SolverInfeasible` and is never retried here.

mod conflict;
mod exact;
mod lp;
mod matching_lp;
mod ports;
mod rounding;
mod vertex_cover;

pub use conflict::{ConflictGraph, conflict_pairs, violation_stats};
pub use exact::ExactSolver;
pub use lp::EPS;
pub use matching_lp::{LpEdge, solve_matching_lp};
pub use ports::BaseSolver;
pub use rounding::{LpRoundingSolver, RoundingPolicy};
pub use vertex_cover::VertexCoverSolver;

#[cfg(test)]
pub(crate) mod test_support {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rsrepair_relation::Relation;

    pub fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Rows over `columns` plus a representative column `S` holding `colors`.
    pub fn colored(columns: &[&str], rows: &[&[&str]], colors: &[&str]) -> Relation {
        let mut header: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        header.push("S".to_string());
        let records = rows
            .iter()
            .zip(colors)
            .map(|(row, color)| {
                row.iter()
                    .map(|v| v.to_string())
                    .chain(std::iter::once(color.to_string()))
                    .collect()
            })
            .collect();
        Relation::from_records(header, "S", records).unwrap()
    }

    /// Like [`colored`] with every row in one category.
    pub fn relation(columns: &[&str], rows: &[&[&str]]) -> Relation {
        let colors = vec!["m"; rows.len()];
        colored(columns, rows, &colors)
    }
}
