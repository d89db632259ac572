//! Relations, functional dependencies and Pareto repair maps.
//!
//! Loading is strict where the repair algorithms need it to be: FD-referenced columns must be
//! complete, and every constrained category must occur in the data. Everything else in a CSV
//! is carried through untouched so the repaired relation can be written back verbatim.

mod fd;
mod load;
mod parse;
mod relation;
mod repair_map;
mod write;

pub use fd::{DecompositionStep, DecompositionTrace, Fd, FdSet, Lhs};
pub use load::{RepairInputs, load_inputs, load_relation, read_relation};
pub use parse::{RcSpec, parse_fdset, parse_rc};
pub use relation::{Relation, Row, Schema, is_missing};
pub use repair_map::RepairMap;
pub use write::{relation_to_csv_string, write_relation, write_relation_file};
