//! Core repair pipeline, extracted from the CLI.
//!
//! These entry points are I/O-agnostic: inputs come through an [`InputSource`] and artifacts
//! leave through a [`WritePort`].

use crate::ports::{InputSource, LoadedInputs, WritePort};
use crate::settings::{Fallback, RepairSettings, Strategy};
use anyhow::{Context, bail};
use camino::Utf8Path;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rsrepair_domain::{FdCleanser, Planner, PlannerConfig, project_best};
use rsrepair_relation::{DecompositionTrace, Relation, RepairMap, relation_to_csv_string};
use rsrepair_solver::{
    BaseSolver, ExactSolver, LpRoundingSolver, RoundingPolicy, VertexCoverSolver, violation_stats,
};
use rsrepair_types::report::{
    RepairReport, ReportArtifacts, ReportRunInfo, ReportToolInfo, ViolationStats,
};
use std::time::Instant;
use tracing::{debug, info};

/// Result of one strategy run.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub strategy: Strategy,
    pub relation: Relation,
    /// Largest candidate before post-clean; kept for the constraint-agnostic baselines only.
    pub before_postclean: Option<Relation>,
    pub report: RepairReport,
}

impl StrategyOutcome {
    pub fn elapsed_secs(&self) -> f64 {
        self.report.run.elapsed_ms as f64 / 1000.0
    }

    /// `[1.234s] Size of RS-repair(lhs-chain): 42`
    pub fn summary_line(&self) -> String {
        format!(
            "[{:.3}s] Size of RS-repair({}): {}",
            self.elapsed_secs(),
            self.strategy,
            self.report.rows
        )
    }
}

/// Run every configured strategy over the inputs from `source`.
///
/// Each strategy draws from its own generator seeded with `settings.seed`, so adding or
/// reordering strategies never changes another strategy's result.
pub fn run_repair(
    settings: &RepairSettings,
    source: &dyn InputSource,
    tool: &ReportToolInfo,
) -> anyhow::Result<Vec<StrategyOutcome>> {
    let loaded = source.load_inputs()?;
    settings
        .strategies
        .iter()
        .map(|&strategy| {
            run_strategy(strategy, settings, &loaded, tool)
                .with_context(|| format!("strategy {strategy}"))
        })
        .collect()
}

pub fn run_strategy(
    strategy: Strategy,
    settings: &RepairSettings,
    loaded: &LoadedInputs,
    tool: &ReportToolInfo,
) -> anyhow::Result<StrategyOutcome> {
    let inputs = &loaded.inputs;
    let (rel, fds, rc) = (&inputs.relation, &inputs.fds, &inputs.rc);
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let started_at = Utc::now().to_rfc3339();
    let start = Instant::now();

    info!(strategy = %strategy, rows = rel.len(), fds = fds.len(), "running strategy");
    let candidates = candidates(strategy, settings, rel, fds, rc, &mut rng)?;

    let postclean = Instant::now();
    let largest = candidates
        .relations()
        .iter()
        .max_by_key(|r| r.len())
        .cloned();
    let relation =
        project_best(candidates.relations(), rc, &mut rng).unwrap_or_else(|| rel.empty_like());
    let postclean_ms = postclean.elapsed().as_millis() as u64;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if !fds.is_consistent(&relation)? {
        bail!("sanity check failed: {strategy} returned a relation that violates {fds}");
    }
    if !rc.qualify(relation.distribution()) {
        bail!(
            "sanity check failed: {strategy} returned distribution {} that does not meet {rc}",
            relation.distribution()
        );
    }

    let run = ReportRunInfo {
        started_at,
        elapsed_ms,
        postclean_ms,
    };
    let mut report = RepairReport::new(tool.clone(), run, strategy.as_str());
    report.seed = settings.seed;
    report.rows_before_postclean = largest.as_ref().map_or(0, |r| r.len() as u64);
    report.rows = relation.len() as u64;
    report.distribution = relation.label_distribution();
    report.inputs = loaded.digests.clone();
    if settings.report_violations {
        report.violations = Some(violation_stats(&relation, fds)?);
    }

    debug!(
        strategy = %strategy,
        candidates = candidates.len(),
        before = report.rows_before_postclean,
        rows = report.rows,
        "strategy finished"
    );

    Ok(StrategyOutcome {
        strategy,
        relation,
        before_postclean: largest.filter(|_| strategy.is_rc_agnostic()),
        report,
    })
}

fn fallback_solver(settings: &RepairSettings) -> Option<Box<dyn BaseSolver>> {
    match settings.fallback {
        Fallback::None => None,
        Fallback::Ilp => Some(Box::new(ExactSolver)),
        Fallback::LpGreedy => Some(Box::new(LpRoundingSolver::new(RoundingPolicy::Greedy))),
        Fallback::LpStratified => {
            Some(Box::new(LpRoundingSolver::new(RoundingPolicy::Stratified)))
        }
        Fallback::LpUniform => Some(Box::new(LpRoundingSolver::new(RoundingPolicy::Uniform))),
        Fallback::FdCleanser => Some(Box::new(FdCleanser::new(settings.matching))),
    }
}

/// Candidate repairs before post-clean.
fn candidates(
    strategy: Strategy,
    settings: &RepairSettings,
    rel: &Relation,
    fds: &rsrepair_relation::FdSet,
    rc: &rsrepair_types::RepresentativeConstraint,
    rng: &mut StdRng,
) -> anyhow::Result<RepairMap> {
    let config = PlannerConfig {
        matching: settings.matching,
    };
    let map = match strategy {
        Strategy::LhsChain => {
            let mut planner = Planner::new(config);
            if let Some(solver) = fallback_solver(settings) {
                planner = planner.with_fallback(solver);
            }
            planner.plan(rel, fds, Some(rc), rng)?
        }
        Strategy::FdCleanser => Planner::new(config)
            .with_fallback(Box::new(FdCleanser::new(settings.matching)))
            .plan(rel, fds, Some(rc), rng)?,
        Strategy::VcApprox => Planner::new(config)
            .with_fallback(Box::new(VertexCoverSolver))
            .plan(rel, fds, None, rng)?,
        Strategy::GlobalIlp => ExactSolver.solve(rel, fds, Some(rc), rng)?,
        Strategy::LpGreedy => {
            LpRoundingSolver::new(RoundingPolicy::Greedy).solve(rel, fds, Some(rc), rng)?
        }
        Strategy::LpStratified => {
            LpRoundingSolver::new(RoundingPolicy::Stratified).solve(rel, fds, Some(rc), rng)?
        }
        Strategy::IlpBaseline => ExactSolver.solve(rel, fds, None, rng)?,
    };
    Ok(map)
}

/// Write the report and relation artifacts of one strategy into `out_dir`.
pub fn write_strategy_artifacts(
    outcome: &StrategyOutcome,
    out_dir: &Utf8Path,
    write_relation: bool,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;
    let name = outcome.strategy.as_str();

    let mut report = outcome.report.clone();
    let mut artifacts = ReportArtifacts::default();
    if write_relation {
        let file = format!("{name}.csv");
        let csv = relation_to_csv_string(&outcome.relation).context("serialize relation")?;
        writer.write_file(&out_dir.join(&file), csv.as_bytes())?;
        artifacts.relation = Some(file);

        if let Some(before) = &outcome.before_postclean {
            let file = format!("{name}.before-postclean.csv");
            let csv = relation_to_csv_string(before).context("serialize relation")?;
            writer.write_file(&out_dir.join(&file), csv.as_bytes())?;
            artifacts.before_postclean = Some(file);
        }
        report.artifacts = Some(artifacts);
    }

    let json = serde_json::to_string_pretty(&report).context("serialize report")?;
    writer.write_file(&out_dir.join(format!("{name}.json")), json.as_bytes())?;
    Ok(())
}

/// Input statistics and the FD decomposition trace.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub rows: usize,
    pub columns: usize,
    pub labels: Vec<String>,
    pub fds: usize,
    pub trace: DecompositionTrace,
    pub violations: ViolationStats,
}

pub fn check_inputs(source: &dyn InputSource) -> anyhow::Result<CheckOutcome> {
    let loaded = source.load_inputs()?;
    let inputs = &loaded.inputs;
    let violations = violation_stats(&inputs.relation, &inputs.fds)?;
    Ok(CheckOutcome {
        rows: inputs.relation.len(),
        columns: inputs.relation.schema().columns().len(),
        labels: inputs.relation.schema().labels().to_vec(),
        fds: inputs.fds.len(),
        trace: inputs.fds.decomposition_trace(),
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryInputSource;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    // A -> B, C -> B: no structural reduction applies.
    const RELATION: &str = "\
A,B,C,S
a1,b1,c1,m
a1,b2,c2,f
a2,b1,c2,m
a3,b3,c3,f
a3,b3,c4,m
";
    const CHAIN_FDS: &str = "A -> B\n";
    const STUCK_FDS: &str = "A -> B\nC -> B\n";
    const RC: &str = "S\nm,f\n0/1,1/3\n";

    fn tool() -> ReportToolInfo {
        ReportToolInfo {
            name: "rsrepair".into(),
            version: "test".into(),
        }
    }

    fn settings(strategies: Vec<Strategy>) -> RepairSettings {
        RepairSettings {
            strategies,
            ..RepairSettings::default()
        }
    }

    #[derive(Default)]
    struct MemWriter {
        files: RefCell<BTreeMap<String, Vec<u8>>>,
    }

    impl WritePort for MemWriter {
        fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
            self.files
                .borrow_mut()
                .insert(path.to_string(), contents.to_vec());
            Ok(())
        }

        fn create_dir_all(&self, _path: &Utf8Path) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_strategy_passes_the_sanity_check() {
        let source = InMemoryInputSource::new(RELATION, STUCK_FDS, RC);
        let mut s = settings(Strategy::ALL.to_vec());
        s.fallback = Fallback::Ilp;
        s.report_violations = true;
        let outcomes = run_repair(&s, &source, &tool()).unwrap();
        assert_eq!(outcomes.len(), Strategy::ALL.len());
        for o in &outcomes {
            assert!(o.report.rows >= 1, "{}", o.strategy);
            assert!(o.report.rows <= o.report.rows_before_postclean);
            assert_eq!(o.report.violations.unwrap().violating_pairs, 0);
            assert_eq!(o.before_postclean.is_some(), o.strategy.is_rc_agnostic());
        }
    }

    #[test]
    fn exact_strategies_agree_on_size() {
        let source = InMemoryInputSource::new(RELATION, CHAIN_FDS, RC);
        let outcomes = run_repair(
            &settings(vec![Strategy::LhsChain, Strategy::GlobalIlp]),
            &source,
            &tool(),
        )
        .unwrap();
        assert_eq!(outcomes[0].report.rows, outcomes[1].report.rows);
        assert_eq!(outcomes[0].report.rows, 4);
    }

    #[test]
    fn lhs_chain_without_fallback_is_a_configuration_error() {
        let source = InMemoryInputSource::new(RELATION, STUCK_FDS, RC);
        let err = run_repair(&settings(vec![Strategy::LhsChain]), &source, &tool()).unwrap_err();
        let repair = err.downcast_ref::<rsrepair_types::RepairError>().unwrap();
        assert_eq!(repair.exit_code(), 2);
    }

    #[test]
    fn reports_carry_inputs_and_distribution() {
        let source = InMemoryInputSource::new(RELATION, CHAIN_FDS, RC);
        let outcome = &run_repair(&settings(vec![Strategy::GlobalIlp]), &source, &tool()).unwrap()[0];
        let r = &outcome.report;
        assert_eq!(r.schema, rsrepair_types::schema::RSREPAIR_REPORT_V1);
        assert_eq!(r.seed, 42);
        assert_eq!(r.inputs.len(), 3);
        assert_eq!(r.distribution.values().sum::<u64>(), r.rows);
        assert!(outcome.summary_line().contains("Size of RS-repair(global-ilp): 4"));
    }

    #[test]
    fn artifacts_are_written_per_strategy() {
        let source = InMemoryInputSource::new(RELATION, CHAIN_FDS, RC);
        let outcomes = run_repair(
            &settings(vec![Strategy::IlpBaseline, Strategy::GlobalIlp]),
            &source,
            &tool(),
        )
        .unwrap();
        let writer = MemWriter::default();
        for o in &outcomes {
            write_strategy_artifacts(o, Utf8Path::new("out"), true, &writer).unwrap();
        }
        let files: Vec<String> = writer.files.borrow().keys().cloned().collect();
        assert_eq!(
            files,
            vec![
                "out/global-ilp.csv",
                "out/global-ilp.json",
                "out/ilp-baseline.before-postclean.csv",
                "out/ilp-baseline.csv",
                "out/ilp-baseline.json",
            ]
        );
        let json = writer.files.borrow()["out/global-ilp.json"].clone();
        let report: RepairReport = serde_json::from_slice(&json).unwrap();
        assert_eq!(
            report.artifacts.unwrap().relation.as_deref(),
            Some("global-ilp.csv")
        );
    }

    #[test]
    fn check_reports_the_trace() {
        let source = InMemoryInputSource::new(RELATION, STUCK_FDS, RC);
        let check = check_inputs(&source).unwrap();
        assert_eq!(check.rows, 5);
        assert_eq!(check.labels, vec!["m", "f"]);
        assert!(!check.trace.is_complete());
        assert_eq!(check.violations.violating_pairs, 2);
    }
}
