use rsrepair_relation::{FdSet, Relation};
use rsrepair_types::RepairResult;
use rsrepair_types::report::ViolationStats;
use std::collections::{BTreeSet, HashMap};

/// FD-violation graph over row positions of one relation.
///
/// Two rows are adjacent when they agree on some FD's left-hand side and disagree on its
/// right-hand side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictGraph {
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<usize>>,
}

impl ConflictGraph {
    pub fn build(rel: &Relation, fds: &FdSet) -> RepairResult<Self> {
        let pairs = conflict_pairs(rel, fds)?;
        let mut adjacency = vec![Vec::new(); rel.len()];
        for &(a, b) in &pairs {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        Ok(Self {
            edges: pairs,
            adjacency,
        })
    }

    /// Number of rows (vertices).
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Conflicting pairs `(a, b)` with `a < b`, sorted.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn neighbours(&self, row: usize) -> &[usize] {
        self.adjacency.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, row: usize) -> usize {
        self.neighbours(row).len()
    }

    pub fn violating_rows(&self) -> usize {
        self.adjacency.iter().filter(|n| !n.is_empty()).count()
    }
}

/// All conflicting row-position pairs, deduplicated across FDs and sorted.
pub fn conflict_pairs(rel: &Relation, fds: &FdSet) -> RepairResult<Vec<(usize, usize)>> {
    let mut pairs = BTreeSet::new();
    for fd in fds.iter() {
        let Some(rhs) = fd.rhs.as_deref().filter(|_| !fd.is_trivial()) else {
            continue;
        };
        let rhs = rel.schema().column_index(rhs)?;
        let lhs = fd
            .lhs
            .iter()
            .map(|c| rel.schema().column_index(c))
            .collect::<RepairResult<Vec<_>>>()?;

        // lhs key -> rhs value -> positions
        let mut groups: HashMap<Vec<&str>, Vec<(&str, Vec<usize>)>> = HashMap::new();
        for (pos, row) in rel.rows().iter().enumerate() {
            let key: Vec<&str> = lhs.iter().map(|&c| row.value(c)).collect();
            let buckets = groups.entry(key).or_default();
            let value = row.value(rhs);
            match buckets.iter_mut().find(|(v, _)| *v == value) {
                Some((_, members)) => members.push(pos),
                None => buckets.push((value, vec![pos])),
            }
        }

        for buckets in groups.values() {
            for (i, (_, left)) in buckets.iter().enumerate() {
                for (_, right) in &buckets[i + 1..] {
                    for &a in left {
                        for &b in right {
                            pairs.insert((a.min(b), a.max(b)));
                        }
                    }
                }
            }
        }
    }
    Ok(pairs.into_iter().collect())
}

pub fn violation_stats(rel: &Relation, fds: &FdSet) -> RepairResult<ViolationStats> {
    let graph = ConflictGraph::build(rel, fds)?;
    let n = rel.len() as u64;
    Ok(ViolationStats {
        violating_pairs: graph.edges().len() as u64,
        total_pairs: n * n.saturating_sub(1) / 2,
        violating_rows: graph.violating_rows() as u64,
    })
}
