use crate::relation::Relation;
use anyhow::Context;
use camino::Utf8Path;
use fs_err as fs;
use std::io;

/// Write `rel` as CSV with its original header and raw values.
pub fn write_relation<W: io::Write>(rel: &Relation, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(rel.schema().columns())
        .context("write CSV header")?;
    for row in rel.rows() {
        wtr.write_record(&row.values)
            .with_context(|| format!("write row {}", row.id))?;
    }
    wtr.flush().context("flush CSV writer")?;
    Ok(())
}

pub fn write_relation_file(rel: &Relation, path: &Utf8Path) -> anyhow::Result<()> {
    let file = fs::File::create(path)?;
    write_relation(rel, io::BufWriter::new(file)).with_context(|| format!("write {path}"))
}

pub fn relation_to_csv_string(rel: &Relation) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    write_relation(rel, &mut buf)?;
    String::from_utf8(buf).context("CSV output is not UTF-8")
}
