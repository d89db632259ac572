use crate::conflict::ConflictGraph;
use crate::lp::{EPS, row_program};
use crate::ports::BaseSolver;
use rand::Rng;
use rand::rngs::StdRng;
use rsrepair_relation::{FdSet, Relation, RepairMap};
use rsrepair_types::{RepairResult, RepresentativeConstraint};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

/// How fractional LP values are turned into a kept/dropped decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingPolicy {
    /// Deprecated: keeps each row with probability equal to its LP value and can reintroduce
    /// conflicts. Logs a warning whenever it runs.
    Uniform,
    /// Fix the fractional row with the fewest conflicts, drop its neighbours, repeat.
    #[default]
    Greedy,
    /// Like `Greedy`, but favour the category furthest below its required share.
    Stratified,
}

impl RoundingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingPolicy::Uniform => "uniform",
            RoundingPolicy::Greedy => "greedy",
            RoundingPolicy::Stratified => "stratified",
        }
    }
}

impl fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LP relaxation of the row program followed by a rounding pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct LpRoundingSolver {
    pub policy: RoundingPolicy,
}

impl LpRoundingSolver {
    pub fn new(policy: RoundingPolicy) -> Self {
        Self { policy }
    }
}

impl BaseSolver for LpRoundingSolver {
    fn name(&self) -> &'static str {
        match self.policy {
            RoundingPolicy::Uniform => "lp-uniform",
            RoundingPolicy::Greedy => "lp-greedy",
            RoundingPolicy::Stratified => "lp-stratified",
        }
    }

    fn solve(
        &self,
        rel: &Relation,
        fds: &FdSet,
        rc: Option<&RepresentativeConstraint>,
        rng: &mut StdRng,
    ) -> RepairResult<RepairMap> {
        let graph = ConflictGraph::build(rel, fds)?;
        let x = row_program(rel, &graph, rc, false, self.name())?;

        let kept = match self.policy {
            RoundingPolicy::Uniform => {
                warn!(
                    solver = self.name(),
                    "uniform LP rounding may reintroduce FD violations"
                );
                x.iter()
                    .enumerate()
                    .filter(|(_, v)| rng.gen_bool(v.clamp(0.0, 1.0)))
                    .map(|(i, _)| i)
                    .collect()
            }
            RoundingPolicy::Greedy | RoundingPolicy::Stratified => {
                greedy_round(rel, &graph, rc, &x, self.policy == RoundingPolicy::Stratified)
            }
        };

        let repair = rel.select(kept);
        debug!(
            solver = self.name(),
            rows = rel.len(),
            kept = repair.len(),
            "LP rounding finished"
        );

        let mut map = RepairMap::with_empty(rel.shared_schema());
        map.insert(repair);
        Ok(map)
    }
}

/// Keep rows already at 1, then repeatedly fix one fractional row and drop its fractional
/// neighbours until nothing fractional is left.
fn greedy_round(
    rel: &Relation,
    graph: &ConflictGraph,
    rc: Option<&RepresentativeConstraint>,
    x: &[f64],
    stratified: bool,
) -> Vec<usize> {
    let mut kept: Vec<usize> = (0..x.len()).filter(|&i| x[i] >= 1.0 - EPS).collect();
    let mut fractional: BTreeSet<usize> = (0..x.len())
        .filter(|&i| x[i] > EPS && x[i] < 1.0 - EPS)
        .collect();
    let mut fixed = vec![0u64; rel.categories()];

    while !fractional.is_empty() {
        let pick = if stratified {
            fractional.iter().copied().min_by(|&a, &b| {
                let key = |r: usize| {
                    let category = rel.rows()[r].category;
                    let f = rc.map(|rc| rc.fraction(category).as_f64()).unwrap_or(0.0);
                    let ratio = if f > 0.0 {
                        fixed[category] as f64 / f
                    } else {
                        f64::INFINITY
                    };
                    (ratio, f, graph.degree(r))
                };
                let (ra, fa, da) = key(a);
                let (rb, fb, db) = key(b);
                ra.total_cmp(&rb)
                    .then(fa.total_cmp(&fb))
                    .then(da.cmp(&db))
            })
        } else {
            fractional.iter().copied().min_by_key(|&r| graph.degree(r))
        };
        let Some(pick) = pick else { break };

        fractional.remove(&pick);
        for n in graph.neighbours(pick) {
            fractional.remove(n);
        }
        fixed[rel.rows()[pick].category] += 1;
        kept.push(pick);
    }

    kept.sort_unstable();
    kept
}
