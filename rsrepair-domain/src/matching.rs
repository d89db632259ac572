//! Matching combiner for LHS marriages.
//!
//! Each edge pairs a left-side value group with a right-side value group and carries one
//! FD-consistent sub-repair. A selection is valid when every left and every right group is used
//! at most once. The relaxed matching program is rounded to such a selection by cancelling
//! fractional cycles and then rounding the fractional forest that remains.

use rsrepair_relation::Relation;
use rsrepair_solver::{EPS, LpEdge, solve_matching_lp};
use rsrepair_types::{ColorDistribution, RepairResult, RepresentativeConstraint};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// A candidate pairing between left group `left` and right group `right`.
#[derive(Debug, Clone)]
pub struct MatchingEdge {
    pub left: usize,
    pub right: usize,
    pub repair: Relation,
}

impl MatchingEdge {
    pub fn distribution(&self) -> &ColorDistribution {
        self.repair.distribution()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchingMethod {
    /// LP relaxation rounded by cycle cancelling and tree rounding.
    #[default]
    FractionalElimination,
    /// Binary edge variables solved exactly.
    Ilp,
}

impl MatchingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchingMethod::FractionalElimination => "fractional",
            MatchingMethod::Ilp => "ilp",
        }
    }
}

impl fmt::Display for MatchingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingCombiner {
    pub method: MatchingMethod,
}

impl MatchingCombiner {
    pub fn new(method: MatchingMethod) -> Self {
        Self { method }
    }

    /// Indices of the selected edges, ascending. No two share a left or a right group.
    pub fn select(
        &self,
        edges: &[MatchingEdge],
        rc: Option<&RepresentativeConstraint>,
    ) -> RepairResult<Vec<usize>> {
        let Some(first) = edges.first() else {
            return Ok(Vec::new());
        };
        let lp_edges: Vec<LpEdge<'_>> = edges
            .iter()
            .map(|e| LpEdge {
                left: e.left,
                right: e.right,
                distribution: e.distribution(),
            })
            .collect();

        let selected = match self.method {
            MatchingMethod::Ilp => {
                let w = solve_matching_lp(&lp_edges, rc, true)?;
                (0..edges.len()).filter(|&i| w[i] > 0.5).collect()
            }
            MatchingMethod::FractionalElimination => {
                let unconstrained;
                let preference = match rc {
                    Some(rc) => rc,
                    None => {
                        unconstrained =
                            RepresentativeConstraint::unconstrained(first.repair.schema().labels());
                        &unconstrained
                    }
                };
                let w = solve_matching_lp(&lp_edges, rc, false)?;
                Rounding::new(edges, w, preference).run()?
            }
        };
        debug!(
            method = %self.method,
            edges = edges.len(),
            selected = selected.len(),
            "matching combined"
        );
        Ok(selected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Node {
    Left(usize),
    Right(usize),
}

/// Iterative rounding state over the LP weights.
struct Rounding<'a> {
    edges: &'a [MatchingEdge],
    weight: Vec<f64>,
    rc: &'a RepresentativeConstraint,
}

impl<'a> Rounding<'a> {
    fn new(edges: &'a [MatchingEdge], weight: Vec<f64>, rc: &'a RepresentativeConstraint) -> Self {
        let mut r = Self { edges, weight, rc };
        for i in 0..r.weight.len() {
            r.clamp(i);
        }
        r
    }

    fn clamp(&mut self, i: usize) {
        let w = &mut self.weight[i];
        if *w < EPS {
            *w = 0.0;
        } else if *w > 1.0 - EPS {
            *w = 1.0;
        }
    }

    fn fractional(&self) -> Vec<usize> {
        (0..self.weight.len())
            .filter(|&i| self.weight[i] > 0.0 && self.weight[i] < 1.0)
            .collect()
    }

    fn ends(&self, i: usize) -> (Node, Node) {
        (Node::Left(self.edges[i].left), Node::Right(self.edges[i].right))
    }

    fn adjacency(&self, active: &[usize]) -> BTreeMap<Node, Vec<(Node, usize)>> {
        let mut adj: BTreeMap<Node, Vec<(Node, usize)>> = BTreeMap::new();
        for &i in active {
            let (l, r) = self.ends(i);
            adj.entry(l).or_default().push((r, i));
            adj.entry(r).or_default().push((l, i));
        }
        adj
    }

    /// Sum of distributions at even and odd positions of `seq`.
    fn class_sums(&self, seq: &[usize]) -> RepairResult<(ColorDistribution, ColorDistribution)> {
        let categories = self.edges[0].distribution().categories();
        let mut even = ColorDistribution::zeros(categories);
        let mut odd = ColorDistribution::zeros(categories);
        for (pos, &i) in seq.iter().enumerate() {
            let target = if pos % 2 == 0 { &mut even } else { &mut odd };
            target.add_assign(self.edges[i].distribution())?;
        }
        Ok((even, odd))
    }

    fn run(mut self) -> RepairResult<Vec<usize>> {
        let mut cycles = 0usize;
        while let Some(cycle) = self.find_cycle() {
            self.cancel(&cycle)?;
            cycles += 1;
        }
        let paths = self.round_forest()?;
        debug!(cycles, paths, "fractional matching rounded");
        Ok((0..self.weight.len())
            .filter(|&i| self.weight[i] == 1.0)
            .collect())
    }

    /// An alternating cycle among fractional edges, as edge indices in walk order.
    fn find_cycle(&self) -> Option<Vec<usize>> {
        let adj = self.adjacency(&self.fractional());
        let mut finished: BTreeSet<Node> = BTreeSet::new();
        for &start in adj.keys() {
            if finished.contains(&start) {
                continue;
            }
            // (node, edge used to reach it, next neighbour to try)
            let mut stack: Vec<(Node, Option<usize>, usize)> = vec![(start, None, 0)];
            let mut on_stack: BTreeSet<Node> = BTreeSet::from([start]);
            while let Some(&(node, via, next)) = stack.last() {
                let neighbours = adj.get(&node).map_or(&[][..], Vec::as_slice);
                let Some(&(to, edge)) = neighbours.get(next) else {
                    stack.pop();
                    on_stack.remove(&node);
                    finished.insert(node);
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.2 += 1;
                }
                if via == Some(edge) || finished.contains(&to) {
                    continue;
                }
                if on_stack.contains(&to) {
                    let from = stack.iter().position(|(n, _, _)| *n == to)?;
                    let mut cycle: Vec<usize> =
                        stack[from + 1..].iter().filter_map(|(_, e, _)| *e).collect();
                    cycle.push(edge);
                    return Some(cycle);
                }
                on_stack.insert(to);
                stack.push((to, Some(edge), 0));
            }
        }
        None
    }

    /// Shift weight around `cycle` toward the preferred alternating class until an edge hits
    /// 0 or 1. Node sums are unchanged.
    fn cancel(&mut self, cycle: &[usize]) -> RepairResult<()> {
        let epsilon = cycle
            .iter()
            .map(|&i| self.weight[i].min(1.0 - self.weight[i]))
            .fold(1.0, f64::min);
        let (even, odd) = self.class_sums(cycle)?;
        let sign = if even.better_than(&odd, self.rc) { 1.0 } else { -1.0 };
        for (pos, &i) in cycle.iter().enumerate() {
            let delta = if pos % 2 == 0 { epsilon } else { -epsilon };
            self.weight[i] = (self.weight[i] + sign * delta).clamp(0.0, 1.0);
            self.clamp(i);
        }
        Ok(())
    }

    /// Round what is left once no fractional cycle remains.
    ///
    /// Repeatedly walks a maximal path of fractional edges from a leaf, keeps the preferred
    /// alternating class of that path and drops the other, then drops every fractional edge that
    /// touches a group the kept edges now use. Paths, not whole trees: a depth-parity class of a
    /// branching tree can put two kept edges on one group.
    fn round_forest(&mut self) -> RepairResult<usize> {
        let mut paths = 0usize;
        loop {
            let active = self.fractional();
            if active.is_empty() {
                return Ok(paths);
            }
            let adj = self.adjacency(&active);
            let leaf = adj
                .iter()
                .find(|(_, n)| n.len() == 1)
                .or_else(|| adj.iter().next())
                .map(|(node, _)| *node);
            let Some(mut node) = leaf else {
                return Ok(paths);
            };

            let mut path: Vec<usize> = Vec::new();
            let mut seen: BTreeSet<Node> = BTreeSet::from([node]);
            while let Some(&(to, edge)) = adj
                .get(&node)
                .and_then(|n| n.iter().find(|(to, _)| !seen.contains(to)))
            {
                path.push(edge);
                seen.insert(to);
                node = to;
            }

            if path.is_empty() {
                return Ok(paths);
            }
            let (even, odd) = self.class_sums(&path)?;
            let keep_even = even.better_than(&odd, self.rc);
            let mut used: BTreeSet<Node> = BTreeSet::new();
            for (pos, &i) in path.iter().enumerate() {
                if (pos % 2 == 0) == keep_even {
                    self.weight[i] = 1.0;
                    let (l, r) = self.ends(i);
                    used.insert(l);
                    used.insert(r);
                } else {
                    self.weight[i] = 0.0;
                }
            }
            for i in self.fractional() {
                let (l, r) = self.ends(i);
                if used.contains(&l) || used.contains(&r) {
                    self.weight[i] = 0.0;
                }
            }
            paths += 1;
        }
    }
}
