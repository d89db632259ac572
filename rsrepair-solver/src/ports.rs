use rand::rngs::StdRng;
use rsrepair_relation::{FdSet, Relation, RepairMap};
use rsrepair_types::{RepairResult, RepresentativeConstraint};

/// Solves a sub-problem the planner cannot decompose any further.
///
/// Every relation in the returned map must be consistent with `fds`. When `rc` is given, exact
/// solvers must also return only constraint-feasible relations; rounding solvers return their best
/// effort and leave exact feasibility to the quota projection.
pub trait BaseSolver {
    fn name(&self) -> &'static str;

    fn solve(
        &self,
        rel: &Relation,
        fds: &FdSet,
        rc: Option<&RepresentativeConstraint>,
        rng: &mut StdRng,
    ) -> RepairResult<RepairMap>;
}
