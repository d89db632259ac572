mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{ConfigMerger, RepairOverrides};
use rsrepair_core::adapters::{FsInputSource, FsWritePort};
use rsrepair_core::pipeline::{check_inputs, run_repair, write_strategy_artifacts};
use rsrepair_core::settings::Strategy;
use rsrepair_types::RepairError;
use rsrepair_types::report::ReportToolInfo;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "rsrepair",
    version,
    about = "Representative S-repairs of relations under functional dependencies."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute a maximum representative repair with one or more strategies.
    Repair(RepairArgs),
    /// Report input statistics and whether the FD set decomposes structurally.
    Check(InputArgs),
    /// List the available repair strategies.
    ListStrategies(ListStrategiesArgs),
}

#[derive(Debug, Parser)]
struct InputArgs {
    /// CSV relation with a header row.
    #[arg(long)]
    relation: Utf8PathBuf,

    /// FD set, one `A,B -> C` rule per line.
    #[arg(long)]
    fdset: Utf8PathBuf,

    /// Representative constraint: column, labels, fractions on three lines.
    #[arg(long)]
    rc: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct RepairArgs {
    #[command(flatten)]
    inputs: InputArgs,

    /// Strategies to run, comma separated (default: lhs-chain).
    #[arg(long, value_delimiter = ',')]
    strategies: Vec<String>,

    /// Solver used when the planner cannot reduce the FD set.
    #[arg(long)]
    fallback: Option<String>,

    /// Matching method for LHS marriages (fractional, ilp).
    #[arg(long)]
    matching: Option<String>,

    /// Seed for every randomized step (default: 42).
    #[arg(long, env = "RSREPAIR_SEED")]
    seed: Option<u64>,

    /// Output directory for artifacts (default: artifacts/rsrepair).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Add FD-violation statistics of the result to each report.
    #[arg(long, default_value_t = false)]
    report_violations: bool,

    /// Write only the JSON reports, not the repaired relations.
    #[arg(long, default_value_t = false)]
    no_write_relation: bool,
}

#[derive(Debug, Parser)]
struct ListStrategiesArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// 2 for bad inputs or configuration, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<RepairError>())
        .map_or(1, RepairError::exit_code)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Repair(args) => cmd_repair(args),
        Command::Check(args) => cmd_check(args),
        Command::ListStrategies(args) => cmd_list_strategies(args),
    }
}

fn input_source(args: &InputArgs) -> FsInputSource {
    FsInputSource::new(args.relation.clone(), args.fdset.clone(), args.rc.clone())
}

fn input_dir(relation: &Utf8Path) -> &Utf8Path {
    match relation.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    }
}

fn cmd_repair(args: RepairArgs) -> anyhow::Result<()> {
    // Load config file and merge with CLI arguments
    let file_config = config::load_or_default(input_dir(&args.inputs.relation))
        .context("load rsrepair.toml config")?;
    let overrides = RepairOverrides {
        strategies: args.strategies,
        fallback: args.fallback,
        matching: args.matching,
        seed: args.seed,
        out_dir: args.out_dir,
        report_violations: args.report_violations,
        no_write_relation: args.no_write_relation,
    };
    let settings = ConfigMerger::new(file_config).merge_repair_args(&overrides)?;

    debug!(
        "merged config: strategies={:?}, fallback={}, matching={}, seed={}",
        settings.strategies, settings.fallback, settings.matching, settings.seed
    );

    let source = input_source(&args.inputs);
    let outcomes = run_repair(&settings, &source, &tool_info())?;

    let writer = FsWritePort;
    for outcome in &outcomes {
        write_strategy_artifacts(outcome, &settings.out_dir, settings.write_relation, &writer)
            .with_context(|| format!("write artifacts to {}", settings.out_dir))?;
        println!("{}", outcome.summary_line());
    }

    info!("wrote {} report(s) to {}", outcomes.len(), settings.out_dir);
    Ok(())
}

fn cmd_check(args: InputArgs) -> anyhow::Result<()> {
    let check = check_inputs(&input_source(&args))?;

    println!("Relation: {} rows, {} columns", check.rows, check.columns);
    println!("Categories: {}", check.labels.join(", "));
    println!("FDs: {}", check.fds);
    println!(
        "Violations: {} of {} row pairs ({:.2}%), {} rows involved",
        check.violations.violating_pairs,
        check.violations.total_pairs,
        check.violations.pair_ratio() * 100.0,
        check.violations.violating_rows
    );
    println!();
    println!("Decomposition:");
    if check.trace.steps.is_empty() {
        println!("  (no structural step applies)");
    }
    for (i, step) in check.trace.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
    if check.trace.is_complete() {
        println!("Complete: lhs-chain needs no fallback.");
    } else {
        println!("Stuck at: {}", check.trace.remaining);
        println!("Use --fallback with lhs-chain, or another strategy.");
    }
    Ok(())
}

fn cmd_list_strategies(args: ListStrategiesArgs) -> anyhow::Result<()> {
    match args.format {
        OutputFormat::Text => {
            println!("Available strategies:\n");
            println!("  {:<14} DESCRIPTION", "NAME");
            println!("  {:<14} -----------", "----");
            for strategy in Strategy::ALL {
                println!("  {:<14} {}", strategy.as_str(), strategy.description());
            }
        }
        OutputFormat::Json => {
            let strategies: Vec<_> = Strategy::ALL
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "name": s.as_str(),
                        "description": s.description(),
                        "rc_agnostic": s.is_rc_agnostic(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&strategies)?);
        }
    }
    Ok(())
}

fn tool_info() -> ReportToolInfo {
    ReportToolInfo {
        name: "rsrepair".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
