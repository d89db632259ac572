use crate::relation::{Relation, Schema};
use rsrepair_types::{ColorDistribution, RepairResult};
use std::collections::HashSet;
use std::sync::Arc;

/// Pareto frontier of candidate repairs, keyed by color distribution.
///
/// Keys are always the stored relation's own distribution, and no key dominates another.
/// Entries iterate in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RepairMap {
    entries: Vec<Relation>,
    keys: HashSet<ColorDistribution>,
}

impl RepairMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(rel: Relation) -> Self {
        let mut map = Self::new();
        map.insert(rel);
        map
    }

    /// `{empty distribution: empty relation}`, the identity of the additive merge.
    pub fn with_empty(schema: Arc<Schema>) -> Self {
        Self::singleton(Relation::empty(schema))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &ColorDistribution) -> bool {
        self.keys.contains(key)
    }

    pub fn get(&self, key: &ColorDistribution) -> Option<&Relation> {
        self.entries.iter().find(|r| r.distribution() == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColorDistribution> {
        self.entries.iter().map(Relation::distribution)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColorDistribution, &Relation)> {
        self.entries.iter().map(|r| (r.distribution(), r))
    }

    pub fn relations(&self) -> &[Relation] {
        &self.entries
    }

    pub fn into_relations(self) -> Vec<Relation> {
        self.entries
    }

    /// Insert honoring the frontier: an existing key or a dominated newcomer is rejected,
    /// entries the newcomer dominates are purged. Returns whether `rel` was stored.
    pub fn insert(&mut self, rel: Relation) -> bool {
        let key = rel.distribution();
        if self.keys.contains(key) {
            return false;
        }
        if self.entries.iter().any(|r| r.distribution().dominates(key)) {
            return false;
        }
        let before = self.entries.len();
        self.entries.retain(|r| !key.dominates(r.distribution()));
        if self.entries.len() != before {
            self.keys = self.entries.iter().map(|r| r.distribution().clone()).collect();
        }
        self.keys.insert(key.clone());
        self.entries.push(rel);
        true
    }

    /// Selective merge: `other`'s entries compete with ours for a place on the frontier.
    pub fn absorb(&mut self, other: RepairMap) {
        for rel in other.entries {
            self.insert(rel);
        }
    }

    /// Additive merge: every pairing of an entry here with one in `other`, unioned.
    pub fn combine(&self, other: &RepairMap) -> RepairResult<RepairMap> {
        let mut out = RepairMap::new();
        for mine in &self.entries {
            for theirs in &other.entries {
                let sum = mine.distribution().try_add(theirs.distribution())?;
                if out.contains_key(&sum) || out.keys().any(|k| k.dominates(&sum)) {
                    continue;
                }
                out.insert(mine.union(theirs)?);
            }
        }
        Ok(out)
    }
}
