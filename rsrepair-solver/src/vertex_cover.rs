use crate::conflict::ConflictGraph;
use crate::ports::BaseSolver;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rsrepair_relation::{FdSet, Relation, RepairMap};
use rsrepair_types::{RepairResult, RepresentativeConstraint};
use tracing::debug;

/// Constraint-agnostic 2-approximation: drop both endpoints of a maximal matching of the
/// violation graph, then re-admit dropped rows that conflict with nothing kept.
///
/// Dropped rows are re-admitted in ascending conflict degree, ties by position, so a row that
/// conflicts with a whole agreeing block cannot come back ahead of that block.
///
/// The edge order of the matching is shuffled with the caller's generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexCoverSolver;

impl BaseSolver for VertexCoverSolver {
    fn name(&self) -> &'static str {
        "vertex-cover"
    }

    fn solve(
        &self,
        rel: &Relation,
        fds: &FdSet,
        _rc: Option<&RepresentativeConstraint>,
        rng: &mut StdRng,
    ) -> RepairResult<RepairMap> {
        let graph = ConflictGraph::build(rel, fds)?;
        let mut edges = graph.edges().to_vec();
        edges.shuffle(rng);

        let mut covered = vec![false; graph.len()];
        for (a, b) in edges {
            if !covered[a] && !covered[b] {
                covered[a] = true;
                covered[b] = true;
            }
        }
        let cover = covered.iter().filter(|c| **c).count();

        let mut kept: Vec<bool> = covered.iter().map(|c| !c).collect();
        let mut removed: Vec<usize> = (0..graph.len()).filter(|&r| covered[r]).collect();
        removed.sort_by_key(|&r| (graph.degree(r), r));
        for row in removed {
            if graph.neighbours(row).iter().all(|&n| !kept[n]) {
                kept[row] = true;
            }
        }
        let kept: Vec<usize> = (0..graph.len()).filter(|&r| kept[r]).collect();

        debug!(
            rows = rel.len(),
            conflicts = graph.edges().len(),
            cover,
            kept = kept.len(),
            "vertex cover approximation finished"
        );
        Ok(RepairMap::singleton(rel.select(kept)))
    }
}
