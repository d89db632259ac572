use crate::conflict::ConflictGraph;
use crate::lp::row_program;
use crate::ports::BaseSolver;
use rand::rngs::StdRng;
use rsrepair_relation::{FdSet, Relation, RepairMap};
use rsrepair_types::{RepairResult, RepresentativeConstraint};
use tracing::debug;

/// Binary integer program over rows: the maximum conflict-free subset, constraint-feasible when
/// a constraint is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSolver;

impl BaseSolver for ExactSolver {
    fn name(&self) -> &'static str {
        "exact-ilp"
    }

    fn solve(
        &self,
        rel: &Relation,
        fds: &FdSet,
        rc: Option<&RepresentativeConstraint>,
        _rng: &mut StdRng,
    ) -> RepairResult<RepairMap> {
        let graph = ConflictGraph::build(rel, fds)?;
        let x = row_program(rel, &graph, rc, true, self.name())?;
        let kept: Vec<usize> = x
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.5)
            .map(|(i, _)| i)
            .collect();

        let repair = rel.select(kept);
        debug!(rows = rel.len(), kept = repair.len(), "exact solve finished");

        let mut map = RepairMap::with_empty(rel.shared_schema());
        map.insert(repair);
        Ok(map)
    }
}
