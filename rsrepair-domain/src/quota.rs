//! Post-clean: cut a conflict-free relation down to the largest size that meets the
//! representative constraint with integral quotas.

use rand::Rng;
use rand::rngs::StdRng;
use rsrepair_relation::Relation;
use rsrepair_types::RepresentativeConstraint;
use tracing::debug;

/// Largest sub-relation of `rel` whose per-category counts satisfy `rc` exactly.
///
/// Scans target sizes `t` from `rel.len()` down. A size is feasible when every category can
/// supply `ceil(t * f_i)` rows and those minimums fit in `t`. Remaining slack is filled one
/// row at a time from a random category that still has spare rows. Each category keeps its
/// first rows in input order.
pub fn project(rel: &Relation, rc: &RepresentativeConstraint, rng: &mut StdRng) -> Relation {
    let available = rel.distribution().counts();
    for t in (0..=rel.len() as u64).rev() {
        let mut demand: Vec<u64> = (0..available.len()).map(|i| rc.quota(i, t)).collect();
        if demand.iter().zip(available).any(|(d, a)| d > a) {
            continue;
        }
        let mut filled: u64 = demand.iter().sum();
        if filled > t {
            continue;
        }
        while filled < t {
            let spare: Vec<usize> = (0..demand.len())
                .filter(|&i| demand[i] < available[i])
                .collect();
            if spare.is_empty() {
                break;
            }
            demand[spare[rng.gen_range(0..spare.len())]] += 1;
            filled += 1;
        }
        debug!(rows = rel.len(), target = t, "quota projection");
        return rel.take_per_category(&demand);
    }
    rel.empty_like()
}

/// Project every candidate and keep the first strictly largest result.
pub fn project_best<'a>(
    candidates: impl IntoIterator<Item = &'a Relation>,
    rc: &RepresentativeConstraint,
    rng: &mut StdRng,
) -> Option<Relation> {
    let mut best: Option<Relation> = None;
    for candidate in candidates {
        let projected = project(candidate, rc, rng);
        if best.as_ref().is_none_or(|b| projected.len() > b.len()) {
            best = Some(projected);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::rng;
    use pretty_assertions::assert_eq;
    use rsrepair_types::Fraction;

    /// `size` rows: `a` rows first, then `minority` rows labelled `b`.
    fn candidate(size: usize, minority: usize) -> Relation {
        let records = (0..size)
            .map(|i| {
                let label = if i < size - minority { "a" } else { "b" };
                vec![i.to_string(), label.to_string()]
            })
            .collect();
        Relation::from_records(vec!["id".into(), "S".into()], "S", records).unwrap()
    }

    fn one_third_b() -> RepresentativeConstraint {
        RepresentativeConstraint::new(
            vec!["a".into(), "b".into()],
            vec![Fraction::ZERO, Fraction::new(1, 3).unwrap()],
        )
        .unwrap()
    }

    #[test]
    fn picks_the_candidate_with_the_largest_feasible_projection() {
        let rc = one_third_b();
        let candidates = [candidate(4, 1), candidate(6, 3), candidate(5, 1), candidate(7, 2)];
        let best = project_best(&candidates, &rc, &mut rng()).unwrap();
        assert_eq!(best.len(), 6);
        assert!(rc.qualify(best.distribution()));
    }

    #[test]
    fn infeasible_sizes_are_skipped() {
        let rc = one_third_b();
        // ceil(7/3) = 3 > 2 available, ceil(6/3) = 2 fits.
        let projected = project(&candidate(7, 2), &rc, &mut rng());
        assert_eq!(projected.len(), 6);
        assert_eq!(projected.distribution().counts(), &[4, 2]);
    }

    #[test]
    fn zero_fractions_keep_everything() {
        let rel = candidate(5, 2);
        let rc = RepresentativeConstraint::unconstrained(rel.schema().labels());
        assert_eq!(project(&rel, &rc, &mut rng()), rel);
    }

    #[test]
    fn slack_is_never_taken_from_a_short_category() {
        let rc = RepresentativeConstraint::new(
            vec!["a".into(), "b".into()],
            vec![Fraction::ZERO, Fraction::new(1, 2).unwrap()],
        )
        .unwrap();
        let projected = project(&candidate(3, 1), &rc, &mut rng());
        assert_eq!(projected.distribution().counts(), &[1, 1]);
    }

    #[test]
    fn no_candidates_yield_none() {
        assert!(project_best(std::iter::empty(), &one_third_b(), &mut rng()).is_none());
    }
}
