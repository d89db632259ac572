use crate::fd::{Fd, FdSet};
use crate::relation::Schema;
use rsrepair_types::{Fraction, RepairError, RepairResult, RepresentativeConstraint};

/// A parsed representative-constraint file: the column it applies to and its fractions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcSpec {
    pub column: String,
    pub constraint: RepresentativeConstraint,
}

fn split_columns(part: &str) -> Vec<String> {
    part.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `A,B -> C,D` rules, one per line. Several right-hand columns expand into independent FDs.
pub fn parse_fdset(text: &str, schema: &Schema) -> RepairResult<FdSet> {
    let mut fds = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (lhs, rhs) = line.split_once("->").ok_or_else(|| {
            RepairError::invalid_input(format!("line {}: expected `lhs -> rhs`, got `{line}`", lineno + 1))
        })?;
        let lhs = split_columns(lhs);
        let rhs = split_columns(rhs);
        if rhs.is_empty() {
            return Err(RepairError::invalid_input(format!(
                "line {}: empty right-hand side",
                lineno + 1
            )));
        }
        for col in lhs.iter().chain(&rhs) {
            schema.column_index(col)?;
        }
        fds.extend(rhs.into_iter().map(|r| Fd::new(lhs.iter().cloned(), r)));
    }
    Ok(FdSet::new(fds))
}

/// Parse the three-line constraint format: column, comma-separated labels, `n/d` fractions.
pub fn parse_rc(text: &str) -> RepairResult<RcSpec> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let [column, labels, fractions] = lines.as_slice() else {
        return Err(RepairError::invalid_input(format!(
            "constraint needs exactly 3 lines (column, labels, fractions), found {}",
            lines.len()
        )));
    };

    let labels: Vec<String> = labels.split(',').map(|l| l.trim().to_string()).collect();
    let fractions = fractions
        .split(',')
        .map(str::parse::<Fraction>)
        .collect::<RepairResult<Vec<_>>>()?;

    Ok(RcSpec {
        column: column.to_string(),
        constraint: RepresentativeConstraint::new(labels, fractions)?,
    })
}
