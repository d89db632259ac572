//! Shared value types for the rsrepair workspace.
//!
//! # Design constraints
//! - Category counts and fractions are exact; no floating point enters a feasibility test.
//! - Report DTOs are serialized to disk. Prefer adding optional fields over changing semantics.

mod color;
mod constraint;
mod error;
pub mod report;

pub use color::ColorDistribution;
pub use constraint::{Fraction, RepresentativeConstraint};
pub use error::{RepairError, RepairResult};

/// Schema identifiers.
pub mod schema {
    pub const RSREPAIR_REPORT_V1: &str = "rsrepair.report.v1";
}
