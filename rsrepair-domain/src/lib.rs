//! Domain logic: decompose a repair problem along its FD structure and stitch the pieces back.
//!
//! This crate owns the recursive planner, the matching combiner used at LHS marriages, and the
//! quota projector that turns a candidate repair into one that meets the representative
//! constraint exactly. Leaf problems are handed to an [`rsrepair_solver::BaseSolver`].

mod cleanser;
mod matching;
mod planner;
mod quota;

pub use cleanser::FdCleanser;
pub use matching::{MatchingCombiner, MatchingEdge, MatchingMethod};
pub use planner::{Planner, PlannerConfig};
pub use quota::{project, project_best};
