use crate::fd::FdSet;
use crate::parse::{parse_fdset, parse_rc};
use crate::relation::Relation;
use anyhow::Context;
use camino::Utf8Path;
use fs_err as fs;
use rsrepair_types::RepresentativeConstraint;
use std::io;
use tracing::debug;

/// A relation together with the FDs and representative constraint it is repaired against.
///
/// The constraint is already aligned to the relation's category enumeration and every
/// FD-referenced column is known to be complete.
#[derive(Debug, Clone)]
pub struct RepairInputs {
    pub relation: Relation,
    pub fds: FdSet,
    pub rc: RepresentativeConstraint,
}

impl RepairInputs {
    /// Assemble inputs from the three text sources: CSV relation, FD rules, constraint file.
    pub fn from_texts(relation_csv: &str, fdset: &str, rc: &str) -> anyhow::Result<Self> {
        let spec = parse_rc(rc).context("parse representative constraint")?;
        let relation = read_relation(relation_csv.as_bytes(), &spec.column)?;
        let fds = parse_fdset(fdset, relation.schema()).context("parse FD set")?;
        let fd_columns = fds.columns();
        relation
            .ensure_complete(fd_columns.iter().map(String::as_str))
            .context("check FD columns for missing values")?;
        let rc = spec
            .constraint
            .aligned_to(relation.schema().labels())
            .context("align representative constraint to relation categories")?;

        debug!(
            rows = relation.len(),
            columns = relation.schema().columns().len(),
            categories = relation.categories(),
            fds = fds.len(),
            "loaded repair inputs"
        );
        Ok(Self { relation, fds, rc })
    }
}

/// Read a headered CSV relation. Every field is kept as text.
pub fn read_relation<R: io::Read>(reader: R, representative: &str) -> anyhow::Result<Relation> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let columns: Vec<String> = rdr
        .headers()
        .context("read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("read CSV record {}", i + 1))?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok(Relation::from_records(columns, representative, records)?)
}

pub fn load_relation(path: &Utf8Path, representative: &str) -> anyhow::Result<Relation> {
    let file = fs::File::open(path)?;
    read_relation(file, representative).with_context(|| format!("load relation {path}"))
}

pub fn load_inputs(
    relation: &Utf8Path,
    fdset: &Utf8Path,
    rc: &Utf8Path,
) -> anyhow::Result<RepairInputs> {
    let relation_csv = fs::read_to_string(relation)?;
    let fdset_text = fs::read_to_string(fdset)?;
    let rc_text = fs::read_to_string(rc)?;
    RepairInputs::from_texts(&relation_csv, &fdset_text, &rc_text)
        .with_context(|| format!("load inputs from {relation}, {fdset}, {rc}"))
}
