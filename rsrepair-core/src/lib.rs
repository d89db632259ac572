//! Embeddable core library for rsrepair.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking into other host
//! processes.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`InputSource`](ports::InputSource): load the relation, FD set and constraint
//! - [`WritePort`](ports::WritePort): write files and create directories
//!
//! The [`adapters`] module provides filesystem-backed and in-memory implementations.
//!
//! # Entry points
//!
//! - [`run_repair`](pipeline::run_repair): run every configured strategy
//! - [`check_inputs`](pipeline::check_inputs): input statistics and the decomposition trace

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export so callers don't need the lower crates directly.
pub use rsrepair_domain::MatchingMethod;
pub use rsrepair_relation::RepairInputs;
pub use rsrepair_solver::RoundingPolicy;
pub use rsrepair_types::RepairError;
