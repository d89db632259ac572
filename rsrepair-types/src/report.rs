use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-strategy run summary written next to the repaired relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairReport {
    pub schema: String,
    pub tool: ReportToolInfo,
    pub run: ReportRunInfo,
    pub strategy: String,
    pub seed: u64,

    /// Rows of the chosen candidate before quota projection.
    pub rows_before_postclean: u64,
    pub rows: u64,

    /// Final row count per representative label, keyed by label.
    #[serde(default)]
    pub distribution: BTreeMap<String, u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violations: Option<ViolationStats>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ReportInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ReportArtifacts>,
}

impl RepairReport {
    pub fn new(tool: ReportToolInfo, run: ReportRunInfo, strategy: impl Into<String>) -> Self {
        Self {
            schema: crate::schema::RSREPAIR_REPORT_V1.to_string(),
            tool,
            run,
            strategy: strategy.into(),
            seed: 0,
            rows_before_postclean: 0,
            rows: 0,
            distribution: BTreeMap::new(),
            violations: None,
            inputs: Vec::new(),
            artifacts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRunInfo {
    /// RFC 3339 timestamp.
    pub started_at: String,
    pub elapsed_ms: u64,
    pub postclean_ms: u64,
}

/// FD-violation metrics of a relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationStats {
    /// Unordered row pairs that violate at least one FD.
    pub violating_pairs: u64,
    /// All unordered row pairs, `n * (n - 1) / 2`.
    pub total_pairs: u64,
    /// Rows that take part in at least one violation.
    pub violating_rows: u64,
}

impl ViolationStats {
    pub fn pair_ratio(&self) -> f64 {
        if self.total_pairs == 0 {
            0.0
        } else {
            self.violating_pairs as f64 / self.total_pairs as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInput {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportArtifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_postclean: Option<String>,
}
