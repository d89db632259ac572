use crate::matching::{MatchingCombiner, MatchingEdge, MatchingMethod};
use rand::rngs::StdRng;
use rsrepair_relation::{FdSet, Lhs, Relation, RepairMap};
use rsrepair_solver::BaseSolver;
use rsrepair_types::{RepairError, RepairResult, RepresentativeConstraint};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlannerConfig {
    pub matching: MatchingMethod,
}

/// Recursive FD-decomposition planner.
///
/// At every call trivial FDs are dropped first, then the structural queries are tried in a
/// fixed order: common LHS column, consensus FD, LHS marriage. The first match decides how the
/// relation is split. When none applies the problem goes to the fallback solver.
pub struct Planner {
    config: PlannerConfig,
    fallback: Option<Box<dyn BaseSolver>>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, solver: Box<dyn BaseSolver>) -> Self {
        self.fallback = Some(solver);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn fallback_name(&self) -> Option<&'static str> {
        self.fallback.as_ref().map(|s| s.name())
    }

    /// Pareto frontier of FD-consistent sub-relations of `rel`.
    pub fn plan(
        &self,
        rel: &Relation,
        fds: &FdSet,
        rc: Option<&RepresentativeConstraint>,
        rng: &mut StdRng,
    ) -> RepairResult<RepairMap> {
        let fds = fds.eliminate_trivial();
        if fds.is_empty() {
            return Ok(RepairMap::singleton(rel.clone()));
        }

        if let Some(column) = fds.find_common_lhs() {
            debug!(rows = rel.len(), column = %column, "common lhs");
            return self.common_lhs(rel, &fds, &column, rc, rng);
        }
        if let Some(column) = fds.find_consensus_fd().and_then(|fd| fd.rhs.clone()) {
            debug!(rows = rel.len(), column = %column, "consensus fd");
            return self.consensus(rel, &fds, &column, rc, rng);
        }
        if let Some((left, right)) = fds.find_lhs_marriage() {
            debug!(rows = rel.len(), ?left, ?right, "lhs marriage");
            return self.marriage(rel, &fds, &left, &right, rc, rng);
        }

        match &self.fallback {
            Some(solver) => {
                debug!(rows = rel.len(), fds = %fds, solver = solver.name(), "fallback");
                solver.solve(rel, &fds, rc, rng)
            }
            None => Err(RepairError::DecompositionExhausted {
                remaining: fds.to_string(),
            }),
        }
    }

    /// Every partition contributes rows independently, so frontiers add up.
    fn common_lhs(
        &self,
        rel: &Relation,
        fds: &FdSet,
        column: &str,
        rc: Option<&RepresentativeConstraint>,
        rng: &mut StdRng,
    ) -> RepairResult<RepairMap> {
        let index = rel.schema().column_index(column)?;
        let reduced = fds.remove_cols(&BTreeSet::from([column.to_string()]));
        let mut acc = RepairMap::with_empty(rel.shared_schema());
        for (_, part) in rel.partition_by(&[index]) {
            let sub = self.plan(&part, &reduced, rc, rng)?;
            acc = acc.combine(&sub)?;
        }
        Ok(acc)
    }

    /// Only one value of the consensus column may survive, so partitions compete.
    fn consensus(
        &self,
        rel: &Relation,
        fds: &FdSet,
        column: &str,
        rc: Option<&RepresentativeConstraint>,
        rng: &mut StdRng,
    ) -> RepairResult<RepairMap> {
        let index = rel.schema().column_index(column)?;
        let reduced = fds.remove_cols(&BTreeSet::from([column.to_string()]));
        let mut acc = RepairMap::new();
        for (_, part) in rel.partition_by(&[index]) {
            acc.absorb(self.plan(&part, &reduced, rc, rng)?);
        }
        if acc.is_empty() {
            return Ok(RepairMap::with_empty(rel.shared_schema()));
        }
        Ok(acc)
    }

    fn marriage(
        &self,
        rel: &Relation,
        fds: &FdSet,
        left: &Lhs,
        right: &Lhs,
        rc: Option<&RepresentativeConstraint>,
        rng: &mut StdRng,
    ) -> RepairResult<RepairMap> {
        let schema = rel.schema();
        let left_cols = left
            .iter()
            .map(|c| schema.column_index(c))
            .collect::<RepairResult<Vec<_>>>()?;
        let right_cols = right
            .iter()
            .map(|c| schema.column_index(c))
            .collect::<RepairResult<Vec<_>>>()?;
        let consumed: BTreeSet<String> = left.union(right).cloned().collect();
        let all_cols = consumed
            .iter()
            .map(|c| schema.column_index(c))
            .collect::<RepairResult<Vec<_>>>()?;
        let reduced = fds.remove_cols(&consumed);

        let mut left_ids: HashMap<Vec<String>, usize> = HashMap::new();
        let mut right_ids: HashMap<Vec<String>, usize> = HashMap::new();
        let mut edges: Vec<MatchingEdge> = Vec::new();
        for (_, part) in rel.partition_by(&all_cols) {
            let Some(row) = part.rows().first() else {
                continue;
            };
            let next = left_ids.len();
            let l = *left_ids.entry(row.key(&left_cols)).or_insert(next);
            let next = right_ids.len();
            let r = *right_ids.entry(row.key(&right_cols)).or_insert(next);
            for repair in self.plan(&part, &reduced, rc, rng)?.into_relations() {
                edges.push(MatchingEdge {
                    left: l,
                    right: r,
                    repair,
                });
            }
        }

        let selected = MatchingCombiner::new(self.config.matching).select(&edges, rc)?;
        let mut combined = rel.empty_like();
        for i in selected {
            combined.extend(&edges[i].repair)?;
        }
        debug!(
            left = left_ids.len(),
            right = right_ids.len(),
            edges = edges.len(),
            rows = combined.len(),
            "marriage combined"
        );
        Ok(RepairMap::singleton(combined))
    }
}
