use pretty_assertions::assert_eq;
use rsrepair_types::report::{
    RepairReport, ReportArtifacts, ReportInput, ReportRunInfo, ReportToolInfo, ViolationStats,
};
use rsrepair_types::{Fraction, RepresentativeConstraint};

fn sample_report() -> RepairReport {
    let mut report = RepairReport::new(
        ReportToolInfo {
            name: "rsrepair".to_string(),
            version: "0.1.0".to_string(),
        },
        ReportRunInfo {
            started_at: "2026-01-01T00:00:00Z".to_string(),
            elapsed_ms: 12,
            postclean_ms: 1,
        },
        "lhs-chain",
    );
    report.seed = 42;
    report.rows_before_postclean = 7;
    report.rows = 6;
    report.distribution.insert("m".to_string(), 4);
    report.distribution.insert("f".to_string(), 2);
    report
}

#[test]
fn report_new_sets_schema() {
    let report = sample_report();
    assert_eq!(report.schema, rsrepair_types::schema::RSREPAIR_REPORT_V1);
}

#[test]
fn report_omits_empty_optionals() {
    let value = serde_json::to_value(sample_report()).expect("serialize report");
    assert!(value.get("violations").is_none());
    assert!(value.get("inputs").is_none());
    assert!(value.get("artifacts").is_none());
    // BTreeMap keys come out sorted.
    assert_eq!(
        value["distribution"],
        serde_json::json!({ "f": 2, "m": 4 })
    );
}

#[test]
fn report_roundtrips_with_everything_set() {
    let mut report = sample_report();
    report.violations = Some(ViolationStats {
        violating_pairs: 3,
        total_pairs: 21,
        violating_rows: 4,
    });
    report.inputs.push(ReportInput {
        path: "data/rel.csv".to_string(),
        sha256: "ab".repeat(32),
    });
    report.artifacts = Some(ReportArtifacts {
        relation: Some("lhs-chain.csv".to_string()),
        before_postclean: None,
    });

    let json = serde_json::to_string_pretty(&report).expect("serialize");
    let back: RepairReport = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, report);
}

#[test]
fn violation_ratio_handles_empty_relation() {
    assert_eq!(ViolationStats::default().pair_ratio(), 0.0);
    let stats = ViolationStats {
        violating_pairs: 1,
        total_pairs: 4,
        violating_rows: 2,
    };
    assert_eq!(stats.pair_ratio(), 0.25);
}

#[test]
fn constraint_serializes_fractions_as_text() {
    let rc = RepresentativeConstraint::new(
        vec!["m".to_string(), "f".to_string()],
        vec![Fraction::ZERO, Fraction::new(1, 3).unwrap()],
    )
    .unwrap();
    let value = serde_json::to_value(&rc).expect("serialize rc");
    assert_eq!(value["fractions"], serde_json::json!(["0/1", "1/3"]));
    let back: RepresentativeConstraint = serde_json::from_value(value).expect("deserialize");
    assert_eq!(back, rc);
}
