//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;
use rsrepair_relation::RepairInputs;
use rsrepair_types::report::ReportInput;

/// Parsed inputs plus the digests of the text they came from.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub inputs: RepairInputs,
    pub digests: Vec<ReportInput>,
}

/// Source of the relation, FD set and representative constraint.
pub trait InputSource {
    fn load_inputs(&self) -> anyhow::Result<LoadedInputs>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
