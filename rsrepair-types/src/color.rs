use crate::constraint::{RepresentativeConstraint, ShareRatio};
use crate::error::{RepairError, RepairResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-category row counts of a relation.
///
/// Equality and hashing are on the exact count vector, which makes a distribution usable as the
/// canonical key of a repair map. There is no `PartialOrd`: the meaningful order is
/// [`dominates`](Self::dominates), which is partial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorDistribution {
    counts: Vec<u64>,
}

impl ColorDistribution {
    pub fn zeros(categories: usize) -> Self {
        Self {
            counts: vec![0; categories],
        }
    }

    pub fn from_counts(counts: Vec<u64>) -> Self {
        Self { counts }
    }

    pub fn categories(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, category: usize) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Record one more row of `category`.
    pub fn increment(&mut self, category: usize) -> RepairResult<()> {
        let categories = self.categories();
        let slot = self
            .counts
            .get_mut(category)
            .ok_or(RepairError::DimensionMismatch {
                left: categories,
                right: category + 1,
            })?;
        *slot += 1;
        Ok(())
    }

    fn check_dims(&self, other: &Self) -> RepairResult<()> {
        if self.categories() != other.categories() {
            return Err(RepairError::DimensionMismatch {
                left: self.categories(),
                right: other.categories(),
            });
        }
        Ok(())
    }

    pub fn try_add(&self, other: &Self) -> RepairResult<Self> {
        let mut out = self.clone();
        out.add_assign(other)?;
        Ok(out)
    }

    pub fn add_assign(&mut self, other: &Self) -> RepairResult<()> {
        self.check_dims(other)?;
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        Ok(())
    }

    /// Component-wise subtraction; fails rather than going negative.
    pub fn try_sub(&self, other: &Self) -> RepairResult<Self> {
        self.check_dims(other)?;
        let counts = self
            .counts
            .iter()
            .zip(&other.counts)
            .enumerate()
            .map(|(category, (&have, &need))| {
                have.checked_sub(need)
                    .ok_or(RepairError::ArithmeticUnderflow {
                        category,
                        have,
                        need,
                    })
            })
            .collect::<RepairResult<Vec<_>>>()?;
        Ok(Self { counts })
    }

    /// `self` is at least as large in every category and strictly larger in one.
    ///
    /// Distributions of different dimensions are incomparable.
    pub fn dominates(&self, other: &Self) -> bool {
        if self.categories() != other.categories() {
            return false;
        }
        let mut strictly = false;
        for (a, b) in self.counts.iter().zip(&other.counts) {
            if a < b {
                return false;
            }
            if a > b {
                strictly = true;
            }
        }
        strictly
    }

    /// Smallest `count / fraction` over the categories the constraint actually requires.
    fn bottleneck(&self, rc: &RepresentativeConstraint) -> Option<ShareRatio> {
        (0..self.categories())
            .filter(|&i| !rc.fraction(i).is_zero())
            .map(|i| ShareRatio::new(self.count(i), rc.fraction(i)))
            .min()
    }

    /// Preference used when rounding: dominance first, then the bottleneck ratio, then size.
    pub fn better_than(&self, other: &Self, rc: &RepresentativeConstraint) -> bool {
        if self.dominates(other) {
            return true;
        }
        match (self.bottleneck(rc), other.bottleneck(rc)) {
            (Some(mine), Some(theirs)) if mine != theirs => mine > theirs,
            _ => self.total() > other.total(),
        }
    }
}

impl fmt::Display for ColorDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.counts.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
