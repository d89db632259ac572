//! Functional dependencies and the structural queries the planner decomposes on.
//!
//! Columns are referred to by name. An FD whose right-hand side was projected away (or lies
//! inside its own left-hand side) is trivial and is dropped by [`FdSet::eliminate_trivial`].

use crate::relation::Relation;
use rsrepair_types::RepairResult;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

pub type Lhs = BTreeSet<String>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fd {
    pub lhs: Lhs,
    /// `None` once the right-hand column has been removed.
    pub rhs: Option<String>,
}

impl Fd {
    pub fn new<I, S>(lhs: I, rhs: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lhs: lhs.into_iter().map(Into::into).collect(),
            rhs: Some(rhs.into()),
        }
    }

    pub fn is_trivial(&self) -> bool {
        match &self.rhs {
            None => true,
            Some(rhs) => self.lhs.contains(rhs),
        }
    }

    pub fn is_consensus(&self) -> bool {
        self.lhs.is_empty()
    }

    fn without(&self, cols: &BTreeSet<String>) -> Self {
        Self {
            lhs: self.lhs.difference(cols).cloned().collect(),
            rhs: self.rhs.clone().filter(|r| !cols.contains(r)),
        }
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lhs: Vec<&str> = self.lhs.iter().map(String::as_str).collect();
        write!(
            f,
            "{} -> {}",
            lhs.join(","),
            self.rhs.as_deref().unwrap_or("{}")
        )
    }
}

/// One structural step found by [`FdSet::decomposition_trace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecompositionStep {
    CommonLhs { column: String },
    Consensus { column: String },
    Marriage { left: Lhs, right: Lhs },
}

impl fmt::Display for DecompositionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |cols: &Lhs| cols.iter().cloned().collect::<Vec<_>>().join(",");
        match self {
            DecompositionStep::CommonLhs { column } => write!(f, "common lhs `{column}`"),
            DecompositionStep::Consensus { column } => write!(f, "consensus on `{column}`"),
            DecompositionStep::Marriage { left, right } => {
                write!(f, "lhs marriage ({}) <-> ({})", join(left), join(right))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompositionTrace {
    pub steps: Vec<DecompositionStep>,
    /// FDs left when no structural query applies any more.
    pub remaining: FdSet,
}

impl DecompositionTrace {
    /// True when structural reduction alone empties the FD set.
    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// An ordered collection of functional dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FdSet {
    fds: Vec<Fd>,
}

impl FdSet {
    pub fn new(fds: Vec<Fd>) -> Self {
        Self { fds }
    }

    pub fn fds(&self) -> &[Fd] {
        &self.fds
    }

    pub fn len(&self) -> usize {
        self.fds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fd> {
        self.fds.iter()
    }

    pub fn eliminate_trivial(&self) -> Self {
        Self {
            fds: self.fds.iter().filter(|fd| !fd.is_trivial()).cloned().collect(),
        }
    }

    /// A column present in the left-hand side of every FD.
    pub fn find_common_lhs(&self) -> Option<String> {
        let (first, rest) = self.fds.split_first()?;
        first
            .lhs
            .iter()
            .find(|col| rest.iter().all(|fd| fd.lhs.contains(*col)))
            .cloned()
    }

    pub fn find_consensus_fd(&self) -> Option<&Fd> {
        self.fds.iter().find(|fd| fd.is_consensus())
    }

    /// Attribute closure of `attrs`: every column implied by `attrs` under this set.
    pub fn closure(&self, attrs: &Lhs) -> BTreeSet<String> {
        let mut closure = attrs.clone();
        loop {
            let mut grew = false;
            for fd in &self.fds {
                if let Some(rhs) = &fd.rhs
                    && fd.lhs.is_subset(&closure)
                    && !closure.contains(rhs)
                {
                    closure.insert(rhs.clone());
                    grew = true;
                }
            }
            if !grew {
                return closure;
            }
        }
    }

    /// Two distinct left-hand sides with equal closures such that every FD's left-hand side
    /// contains one of them.
    pub fn find_lhs_marriage(&self) -> Option<(Lhs, Lhs)> {
        for (i, a) in self.fds.iter().enumerate() {
            for b in &self.fds[i + 1..] {
                if a.lhs == b.lhs {
                    continue;
                }
                if self.closure(&a.lhs) != self.closure(&b.lhs) {
                    continue;
                }
                let covers = self
                    .fds
                    .iter()
                    .all(|fd| a.lhs.is_subset(&fd.lhs) || b.lhs.is_subset(&fd.lhs));
                if covers {
                    return Some((a.lhs.clone(), b.lhs.clone()));
                }
            }
        }
        None
    }

    /// Project `cols` out of every FD, then drop the FDs that became trivial.
    pub fn remove_cols(&self, cols: &BTreeSet<String>) -> Self {
        Self {
            fds: self.fds.iter().map(|fd| fd.without(cols)).collect(),
        }
        .eliminate_trivial()
    }

    /// The left-hand column that occurs in the most FDs, with the index of the first FD using it.
    ///
    /// Ties go to the column seen first while scanning FDs in order.
    pub fn most_frequent_lhs_column(&self) -> Option<(String, usize)> {
        let mut order: Vec<&String> = Vec::new();
        let mut freq: BTreeMap<&String, usize> = BTreeMap::new();
        for fd in &self.fds {
            for col in &fd.lhs {
                let n = freq.entry(col).or_insert_with(|| {
                    order.push(col);
                    0
                });
                *n += 1;
            }
        }
        let mut best: Option<(&String, usize)> = None;
        for col in order {
            let n = freq[col];
            if best.is_none_or(|(_, m)| n > m) {
                best = Some((col, n));
            }
        }
        let (col, _) = best?;
        let fd = self.fds.iter().position(|fd| fd.lhs.contains(col))?;
        Some((col.clone(), fd))
    }

    pub fn without_fd(&self, index: usize) -> Self {
        Self {
            fds: self
                .fds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, fd)| fd.clone())
                .collect(),
        }
    }

    pub fn only_fd(&self, index: usize) -> Self {
        Self {
            fds: self.fds.get(index).cloned().into_iter().collect(),
        }
    }

    /// Every column referenced by a left- or right-hand side.
    pub fn columns(&self) -> BTreeSet<String> {
        self.fds
            .iter()
            .flat_map(|fd| fd.lhs.iter().chain(fd.rhs.iter()))
            .cloned()
            .collect()
    }

    /// Replay the structural queries on the FDs alone, without data.
    pub fn decomposition_trace(&self) -> DecompositionTrace {
        let mut delta = self.eliminate_trivial();
        let mut steps = Vec::new();
        while !delta.is_empty() {
            let (step, consumed) = if let Some(column) = delta.find_common_lhs() {
                let consumed = BTreeSet::from([column.clone()]);
                (DecompositionStep::CommonLhs { column }, consumed)
            } else if let Some(column) = delta.find_consensus_fd().and_then(|fd| fd.rhs.clone()) {
                let consumed = BTreeSet::from([column.clone()]);
                (DecompositionStep::Consensus { column }, consumed)
            } else if let Some((left, right)) = delta.find_lhs_marriage() {
                let consumed = left.union(&right).cloned().collect();
                (DecompositionStep::Marriage { left, right }, consumed)
            } else {
                break;
            };
            steps.push(step);
            delta = delta.remove_cols(&consumed);
        }
        DecompositionTrace {
            steps,
            remaining: delta,
        }
    }

    /// No two rows agree on an FD's left-hand side while disagreeing on its right-hand side.
    pub fn is_consistent(&self, rel: &Relation) -> RepairResult<bool> {
        for fd in self.fds.iter().filter(|fd| !fd.is_trivial()) {
            let Some(rhs) = &fd.rhs else { continue };
            let rhs = rel.schema().column_index(rhs)?;
            let lhs = fd
                .lhs
                .iter()
                .map(|c| rel.schema().column_index(c))
                .collect::<RepairResult<Vec<_>>>()?;
            let mut seen: HashMap<Vec<&str>, &str> = HashMap::new();
            for row in rel.rows() {
                let key: Vec<&str> = lhs.iter().map(|&c| row.value(c)).collect();
                let value = row.value(rhs);
                if let Some(prev) = seen.insert(key, value)
                    && prev != value
                {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

impl fmt::Display for FdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.fds.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", parts.join("; "))
    }
}
