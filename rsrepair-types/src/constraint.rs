use crate::color::ColorDistribution;
use crate::error::{RepairError, RepairResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Exact non-negative rational number, always stored in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fraction {
    numerator: u64,
    denominator: u64,
}

impl Fraction {
    pub const ZERO: Fraction = Fraction {
        numerator: 0,
        denominator: 1,
    };

    pub fn new(numerator: u64, denominator: u64) -> RepairResult<Self> {
        if denominator == 0 {
            return Err(RepairError::invalid_input(format!(
                "fraction {numerator}/0 has a zero denominator"
            )));
        }
        let g = gcd(numerator, denominator);
        Ok(Self {
            numerator: numerator / g,
            denominator: denominator / g,
        })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// `ceil(t * self)`, the integer quota of a share of `t` rows.
    pub fn ceil_mul(&self, t: u64) -> u64 {
        let num = t as u128 * self.numerator as u128;
        let den = self.denominator as u128;
        num.div_ceil(den) as u64
    }

    /// Whether `count >= total * self` holds exactly (no flooring).
    pub fn is_met_by(&self, count: u64, total: u64) -> bool {
        count as u128 * self.denominator as u128 >= total as u128 * self.numerator as u128
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for Fraction {
    type Err = RepairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|e| RepairError::invalid_input(format!("fraction `{s}`: {e}")))
        };
        match s.split_once('/') {
            Some((num, den)) => Fraction::new(parse(num)?, parse(den)?),
            None => Fraction::new(parse(s)?, 1),
        }
    }
}

impl TryFrom<String> for Fraction {
    type Error = RepairError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Fraction> for String {
    fn from(value: Fraction) -> Self {
        value.to_string()
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

/// Bottleneck ratio `count / fraction` kept as an exact quotient.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ShareRatio {
    scaled: u128,
    per: u128,
}

impl ShareRatio {
    pub(crate) fn new(count: u64, fraction: Fraction) -> Self {
        Self {
            scaled: count as u128 * fraction.denominator as u128,
            per: fraction.numerator as u128,
        }
    }
}

impl PartialEq for ShareRatio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ShareRatio {}

impl PartialOrd for ShareRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ShareRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        match (
            self.scaled.checked_mul(other.per),
            other.scaled.checked_mul(self.per),
        ) {
            (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
            _ => {
                let lhs = self.scaled as f64 / self.per as f64;
                let rhs = other.scaled as f64 / other.per as f64;
                lhs.total_cmp(&rhs)
            }
        }
    }
}

/// Minimum proportional share required for each category of the representative column.
///
/// Fractions are positional: `fractions[i]` belongs to `labels[i]`. After
/// [`aligned_to`](Self::aligned_to) the position is the relation's category index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentativeConstraint {
    labels: Vec<String>,
    fractions: Vec<Fraction>,
}

impl RepresentativeConstraint {
    pub fn new(labels: Vec<String>, fractions: Vec<Fraction>) -> RepairResult<Self> {
        if labels.len() != fractions.len() {
            return Err(RepairError::invalid_input(format!(
                "{} labels but {} fractions",
                labels.len(),
                fractions.len()
            )));
        }
        let mut seen = BTreeSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(RepairError::invalid_input(format!(
                    "duplicate category label `{label}`"
                )));
            }
        }

        let (mut sum_num, mut sum_den) = (0u128, 1u128);
        for f in &fractions {
            sum_num = sum_num * f.denominator as u128 + f.numerator as u128 * sum_den;
            sum_den *= f.denominator as u128;
            let g = gcd_u128(sum_num, sum_den);
            sum_num /= g;
            sum_den /= g;
        }
        if sum_num > sum_den {
            return Err(RepairError::invalid_input(format!(
                "fractions sum to {sum_num}/{sum_den}, which exceeds 1"
            )));
        }

        Ok(Self { labels, fractions })
    }

    /// A constraint that requires nothing of any category.
    pub fn unconstrained(labels: &[String]) -> Self {
        Self {
            labels: labels.to_vec(),
            fractions: vec![Fraction::ZERO; labels.len()],
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn fractions(&self) -> &[Fraction] {
        &self.fractions
    }

    pub fn categories(&self) -> usize {
        self.fractions.len()
    }

    /// Required fraction of a category; categories beyond the constraint require nothing.
    pub fn fraction(&self, category: usize) -> Fraction {
        self.fractions
            .get(category)
            .copied()
            .unwrap_or(Fraction::ZERO)
    }

    pub fn has_positive_fraction(&self) -> bool {
        self.fractions.iter().any(|f| !f.is_zero())
    }

    /// Re-index this constraint onto a relation's category enumeration.
    ///
    /// Categories without an entry get fraction 0. A constrained label that never occurs in the
    /// relation is rejected.
    pub fn aligned_to(&self, categories: &[String]) -> RepairResult<Self> {
        if let Some(label) = self.labels.iter().find(|l| !categories.contains(l)) {
            return Err(RepairError::UnknownCategory {
                label: label.clone(),
            });
        }
        let fractions = categories
            .iter()
            .map(|c| {
                self.labels
                    .iter()
                    .position(|l| l == c)
                    .map(|i| self.fractions[i])
                    .unwrap_or(Fraction::ZERO)
            })
            .collect();
        Ok(Self {
            labels: categories.to_vec(),
            fractions,
        })
    }

    /// Feasibility test: every category holds at least its exact share of the total.
    pub fn qualify(&self, d: &ColorDistribution) -> bool {
        let total = d.total();
        (0..d.categories()).all(|i| self.fraction(i).is_met_by(d.count(i), total))
    }

    /// Integer quota of category `category` in a relation of `t` rows.
    pub fn quota(&self, category: usize, t: u64) -> u64 {
        self.fraction(category).ceil_mul(t)
    }
}

impl fmt::Display for RepresentativeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .labels
            .iter()
            .zip(&self.fractions)
            .map(|(l, fr)| format!("{l}>={fr}"))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(ls: &[&str]) -> Vec<String> {
        ls.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn fraction_parses_and_reduces() {
        let f: Fraction = "2/6".parse().unwrap();
        assert_eq!(f.numerator(), 1);
        assert_eq!(f.denominator(), 3);
        assert_eq!(f.to_string(), "1/3");
        assert!("1/0".parse::<Fraction>().is_err());
        assert!("x/2".parse::<Fraction>().is_err());
        assert_eq!("0".parse::<Fraction>().unwrap(), Fraction::ZERO);
    }

    #[test]
    fn ceil_mul_rounds_up() {
        let third = Fraction::new(1, 3).unwrap();
        assert_eq!(third.ceil_mul(6), 2);
        assert_eq!(third.ceil_mul(7), 3);
        assert_eq!(third.ceil_mul(0), 0);
    }

    #[test]
    fn constraint_rejects_sum_above_one() {
        let err = RepresentativeConstraint::new(
            labels(&["a", "b"]),
            vec![Fraction::new(2, 3).unwrap(), Fraction::new(1, 2).unwrap()],
        )
        .unwrap_err();
        assert!(matches!(err, RepairError::InvalidInput { .. }));
    }

    #[test]
    fn constraint_rejects_length_mismatch() {
        assert!(
            RepresentativeConstraint::new(labels(&["a"]), vec![Fraction::ZERO, Fraction::ZERO])
                .is_err()
        );
    }

    #[test]
    fn qualify_uses_exact_shares() {
        let rc = RepresentativeConstraint::new(
            labels(&["m", "f"]),
            vec![Fraction::ZERO, Fraction::new(1, 3).unwrap()],
        )
        .unwrap();
        assert!(rc.qualify(&ColorDistribution::from_counts(vec![4, 2])));
        assert!(!rc.qualify(&ColorDistribution::from_counts(vec![5, 2])));
        assert!(rc.qualify(&ColorDistribution::zeros(2)));
    }

    #[test]
    fn aligned_to_reorders_and_fills_zero() {
        let rc = RepresentativeConstraint::new(
            labels(&["f"]),
            vec![Fraction::new(1, 4).unwrap()],
        )
        .unwrap();
        let aligned = rc.aligned_to(&labels(&["m", "f", "x"])).unwrap();
        assert_eq!(aligned.fraction(0), Fraction::ZERO);
        assert_eq!(aligned.fraction(1), Fraction::new(1, 4).unwrap());
        assert_eq!(aligned.fraction(2), Fraction::ZERO);

        let err = rc.aligned_to(&labels(&["m"])).unwrap_err();
        assert_eq!(
            err,
            RepairError::UnknownCategory {
                label: "f".to_string()
            }
        );
    }
}
