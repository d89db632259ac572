//! Default port implementations.

use crate::ports::{InputSource, LoadedInputs, WritePort};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use rsrepair_relation::RepairInputs;
use rsrepair_types::report::ReportInput;
use sha2::{Digest, Sha256};
use tracing::debug;

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn digest(path: impl Into<String>, text: &str) -> ReportInput {
    ReportInput {
        path: path.into(),
        sha256: sha256_hex(text.as_bytes()),
    }
}

/// Loads the three inputs from files.
#[derive(Debug, Clone)]
pub struct FsInputSource {
    pub relation: Utf8PathBuf,
    pub fdset: Utf8PathBuf,
    pub rc: Utf8PathBuf,
}

impl FsInputSource {
    pub fn new(relation: Utf8PathBuf, fdset: Utf8PathBuf, rc: Utf8PathBuf) -> Self {
        Self {
            relation,
            fdset,
            rc,
        }
    }
}

impl InputSource for FsInputSource {
    fn load_inputs(&self) -> anyhow::Result<LoadedInputs> {
        let relation = fs::read_to_string(&self.relation)?;
        let fdset = fs::read_to_string(&self.fdset)?;
        let rc = fs::read_to_string(&self.rc)?;
        debug!(
            relation = %self.relation,
            fdset = %self.fdset,
            rc = %self.rc,
            "read input files"
        );

        let inputs = RepairInputs::from_texts(&relation, &fdset, &rc)
            .with_context(|| format!("load inputs from {}", self.relation))?;
        Ok(LoadedInputs {
            inputs,
            digests: vec![
                digest(self.relation.as_str(), &relation),
                digest(self.fdset.as_str(), &fdset),
                digest(self.rc.as_str(), &rc),
            ],
        })
    }
}

/// In-memory input source for embedding and testing.
#[derive(Debug, Clone)]
pub struct InMemoryInputSource {
    pub relation: String,
    pub fdset: String,
    pub rc: String,
}

impl InMemoryInputSource {
    pub fn new(
        relation: impl Into<String>,
        fdset: impl Into<String>,
        rc: impl Into<String>,
    ) -> Self {
        Self {
            relation: relation.into(),
            fdset: fdset.into(),
            rc: rc.into(),
        }
    }
}

impl InputSource for InMemoryInputSource {
    fn load_inputs(&self) -> anyhow::Result<LoadedInputs> {
        let inputs = RepairInputs::from_texts(&self.relation, &self.fdset, &self.rc)?;
        Ok(LoadedInputs {
            inputs,
            digests: vec![
                digest("<memory>/relation.csv", &self.relation),
                digest("<memory>/fdset.txt", &self.fdset),
                digest("<memory>/rc.txt", &self.rc),
            ],
        })
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}
