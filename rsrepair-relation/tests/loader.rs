//! Tests for loading relations, FD sets and constraints from disk.

use camino::Utf8PathBuf;
use pretty_assertions::assert_eq;
use rsrepair_relation::{
    RepairInputs, load_inputs, load_relation, relation_to_csv_string, write_relation_file,
};
use rsrepair_types::{Fraction, RepairError};
use std::fs;
use tempfile::TempDir;

fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("tempdir")
}

fn write(temp: &TempDir, name: &str, contents: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(temp.path().join(name)).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

const RELATION: &str = "\
zip,city,state,gender
10001,NYC,NY,m
10001,New York,NY,f
94105,SF,CA,f
94105,SF,CA,m
";

#[test]
fn test_load_inputs_aligns_constraint() {
    let temp = create_temp_dir();
    let rel = write(&temp, "rel.csv", RELATION);
    let fds = write(&temp, "fds.txt", "zip -> city,state\n");
    let rc = write(&temp, "rc.txt", "gender\nf\n1/2\n");

    let inputs = load_inputs(&rel, &fds, &rc).unwrap();
    assert_eq!(inputs.relation.len(), 4);
    assert_eq!(inputs.fds.len(), 2);
    assert_eq!(inputs.relation.schema().labels(), ["m".to_string(), "f".to_string()]);
    assert_eq!(inputs.rc.fraction(0), Fraction::ZERO);
    assert_eq!(inputs.rc.fraction(1), Fraction::new(1, 2).unwrap());
}

#[test]
fn test_missing_fd_column_value_is_rejected() {
    let err = RepairInputs::from_texts(
        "zip,city,gender\n10001,,m\n10002,LA,f\n",
        "zip -> city\n",
        "gender\nm,f\n0/1,0/1\n",
    )
    .unwrap_err();
    let typed = err.downcast_ref::<RepairError>().expect("typed error");
    assert_eq!(
        typed,
        &RepairError::MissingData {
            column: "city".to_string(),
            rows: 1
        }
    );
}

#[test]
fn test_missing_value_outside_fds_is_allowed() {
    let inputs = RepairInputs::from_texts(
        "zip,city,note,gender\n10001,NYC,,m\n10002,LA,x,f\n",
        "zip -> city\n",
        "gender\nm\n1/4\n",
    )
    .unwrap();
    assert_eq!(inputs.relation.len(), 2);
}

#[test]
fn test_unknown_constraint_label_is_rejected() {
    let err = RepairInputs::from_texts(
        "zip,gender\n1,m\n",
        "",
        "gender\nm,x\n1/4,1/4\n",
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RepairError>(),
        Some(RepairError::UnknownCategory { label }) if label == "x"
    ));
}

#[test]
fn test_unknown_representative_column_is_rejected() {
    let err = RepairInputs::from_texts("zip,city\n1,a\n", "", "gender\nm\n1/4\n").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RepairError>(),
        Some(RepairError::UnknownColumn { .. })
    ));
}

#[test]
fn test_missing_relation_file_reports_path() {
    let temp = create_temp_dir();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("nope.csv")).unwrap();
    let err = load_relation(&path, "gender").unwrap_err();
    assert!(format!("{err:#}").contains("nope.csv"));
}

#[test]
fn test_write_preserves_header_and_values() {
    let temp = create_temp_dir();
    let path = write(&temp, "rel.csv", RELATION);
    let rel = load_relation(&path, "gender").unwrap();

    let out = Utf8PathBuf::from_path_buf(temp.path().join("out.csv")).unwrap();
    write_relation_file(&rel, &out).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), RELATION);
    assert_eq!(relation_to_csv_string(&rel).unwrap(), RELATION);
}
