//! Error taxonomy shared by every rsrepair crate.
//!
//! Errors fall in two families:
//! - Configuration errors (exit code 2): malformed or incomplete inputs, or a planner that was
//!   asked to reduce an FD set it cannot reduce without a base solver.
//! - Fatal runtime errors (exit code 1): dimension/arithmetic bugs and solver failures. These
//!   indicate a defect and are never retried.

use thiserror::Error;

/// The top-level error type for rsrepair operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepairError {
    /// Two color distributions with different category counts were combined.
    #[error("dimension mismatch: {left} categories vs {right} categories")]
    DimensionMismatch { left: usize, right: usize },

    /// Subtraction would drive a category count below zero.
    #[error("arithmetic underflow in category {category}: {have} < {need}")]
    ArithmeticUnderflow { category: usize, have: u64, need: u64 },

    /// The planner ran out of structural reductions and no base solver was configured.
    #[error("decomposition exhausted with no base solver configured; remaining FDs: {remaining}")]
    DecompositionExhausted { remaining: String },

    /// The mathematical-programming backend could not find any feasible point.
    #[error("solver {solver} found no feasible point: {message}")]
    SolverInfeasible { solver: String, message: String },

    /// An FD-referenced column (or the representative column) contains unfilled values.
    #[error("missing values in column {column} ({rows} rows)")]
    MissingData { column: String, rows: usize },

    /// A column named in an FD or RC does not exist in the relation header.
    #[error("unknown column: {column}")]
    UnknownColumn { column: String },

    /// An RC label never occurs in the representative column.
    #[error("unknown category label: {label}")]
    UnknownCategory { label: String },

    /// Malformed FD, RC or relation text.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepairError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        RepairError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn infeasible(solver: impl Into<String>, message: impl Into<String>) -> Self {
        RepairError::SolverInfeasible {
            solver: solver.into(),
            message: message.into(),
        }
    }

    /// Returns true when the caller supplied bad inputs or an incomplete configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            RepairError::MissingData { .. }
                | RepairError::UnknownColumn { .. }
                | RepairError::UnknownCategory { .. }
                | RepairError::InvalidInput { .. }
                | RepairError::DecompositionExhausted { .. }
        )
    }

    /// Returns the recommended process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_configuration_error() { 2 } else { 1 }
    }
}

/// Result type alias using RepairError.
pub type RepairResult<T> = Result<T, RepairError>;
