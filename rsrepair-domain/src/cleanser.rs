use crate::matching::MatchingMethod;
use crate::planner::{Planner, PlannerConfig};
use crate::quota::project_best;
use rand::rngs::StdRng;
use rsrepair_relation::{FdSet, Relation, RepairMap};
use rsrepair_solver::BaseSolver;
use rsrepair_types::{RepairResult, RepresentativeConstraint};
use tracing::debug;

/// Fallback that resolves one FD at a time.
///
/// Picks the left-hand column shared by the most FDs and plans the relation against the first
/// FD using it. A single FD always decomposes structurally, so no other solver is involved.
/// The resulting frontier is projected onto the constraint before the next FD is handled.
#[derive(Default)]
pub struct FdCleanser {
    planner: Planner,
}

impl FdCleanser {
    pub fn new(matching: MatchingMethod) -> Self {
        Self {
            planner: Planner::new(PlannerConfig { matching }),
        }
    }
}

impl BaseSolver for FdCleanser {
    fn name(&self) -> &'static str {
        "fd-cleanser"
    }

    fn solve(
        &self,
        rel: &Relation,
        fds: &FdSet,
        rc: Option<&RepresentativeConstraint>,
        rng: &mut StdRng,
    ) -> RepairResult<RepairMap> {
        let mut current = rel.clone();
        let mut remaining = fds.eliminate_trivial();
        while !remaining.is_empty() {
            let (column, index) = remaining
                .most_frequent_lhs_column()
                .map_or((None, 0), |(c, i)| (Some(c), i));
            debug!(
                column = column.as_deref().unwrap_or("-"),
                fd = %remaining.fds()[index],
                rows = current.len(),
                "cleansing fd"
            );
            let map = self.planner.plan(&current, &remaining.only_fd(index), rc, rng)?;
            current = match rc {
                Some(rc) => project_best(map.relations(), rc, rng),
                None => map.into_relations().into_iter().max_by_key(Relation::len),
            }
            .unwrap_or_else(|| current.empty_like());
            remaining = remaining.without_fd(index);
        }
        Ok(RepairMap::singleton(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{colored, rng};
    use rsrepair_relation::Fd;
    use rsrepair_types::Fraction;

    #[test]
    fn resolves_a_chain_the_planner_cannot_reduce() {
        let rel = colored(
            &["A", "B", "C"],
            &[
                &["1", "2", "3"],
                &["1", "4", "3"],
                &["5", "2", "6"],
                &["7", "8", "9"],
            ],
            &["m", "f", "m", "f"],
        );
        let fds = FdSet::new(vec![Fd::new(["A"], "B"), Fd::new(["B"], "C")]);
        let rc = RepresentativeConstraint::new(
            rel.schema().labels().to_vec(),
            vec![Fraction::ZERO, Fraction::new(1, 4).unwrap()],
        )
        .unwrap();

        let map = FdCleanser::default()
            .solve(&rel, &fds, Some(&rc), &mut rng())
            .unwrap();
        assert_eq!(map.len(), 1);
        let repair = &map.relations()[0];
        assert!(fds.is_consistent(repair).unwrap());
        assert!(rc.qualify(repair.distribution()));
        assert!(repair.len() >= 2);
    }

    #[test]
    fn consensus_only_sets_are_handled() {
        let rel = colored(&["B"], &[&["1"], &["2"], &["2"]], &["m", "m", "f"]);
        let fds = FdSet::new(vec![Fd::new(Vec::<String>::new(), "B")]);
        let map = FdCleanser::default().solve(&rel, &fds, None, &mut rng()).unwrap();
        assert_eq!(map.relations()[0].len(), 2);
    }
}
