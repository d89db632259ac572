//! Configuration file loading for rsrepair.
//!
//! Discovers and loads `rsrepair.toml` from the directory holding the relation file.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use rsrepair_core::settings::{Fallback, RepairSettings, Strategy, parse_matching};
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "rsrepair.toml";

/// Top-level configuration from rsrepair.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RsrepairConfig {
    pub solver: SolverConfig,
    pub output: OutputConfig,
}

/// Solver section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Strategy names, run in order.
    pub strategies: Vec<String>,

    /// Fallback for FD sets the planner cannot reduce.
    pub fallback: Option<String>,

    /// `fractional` or `ilp`.
    pub matching: Option<String>,

    pub seed: Option<u64>,
}

/// Output section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub out_dir: Option<Utf8PathBuf>,
    pub report_violations: bool,
    pub write_relation: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: None,
            report_violations: false,
            write_relation: true,
        }
    }
}

/// Discover the rsrepair.toml config file next to the inputs.
pub fn discover_config(input_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = input_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a rsrepair.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<RsrepairConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<RsrepairConfig> {
    let config: RsrepairConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the input directory, or return default if not found.
pub fn load_or_default(input_dir: &Utf8Path) -> anyhow::Result<RsrepairConfig> {
    match discover_config(input_dir) {
        Some(path) => load_config(&path),
        None => Ok(RsrepairConfig::default()),
    }
}

/// Repair flags as given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct RepairOverrides {
    pub strategies: Vec<String>,
    pub fallback: Option<String>,
    pub matching: Option<String>,
    pub seed: Option<u64>,
    pub out_dir: Option<Utf8PathBuf>,
    pub report_violations: bool,
    pub no_write_relation: bool,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: RsrepairConfig,
}

impl ConfigMerger {
    pub fn new(config: RsrepairConfig) -> Self {
        Self { config }
    }

    /// Merge with repair command CLI arguments.
    ///
    /// CLI strategies extend the config file list; duplicates keep their first position.
    /// Scalar flags override the file. Names are validated here, so a typo in either
    /// source is reported as invalid input.
    pub fn merge_repair_args(self, cli: &RepairOverrides) -> anyhow::Result<RepairSettings> {
        let defaults = RepairSettings::default();
        let solver = self.config.solver;
        let output = self.config.output;

        let mut strategies: Vec<Strategy> = Vec::new();
        for name in solver.strategies.iter().chain(&cli.strategies) {
            let strategy: Strategy = name.parse()?;
            if !strategies.contains(&strategy) {
                strategies.push(strategy);
            }
        }
        if strategies.is_empty() {
            strategies = defaults.strategies;
        }

        let fallback = match cli.fallback.as_deref().or(solver.fallback.as_deref()) {
            Some(name) => name.parse::<Fallback>()?,
            None => defaults.fallback,
        };
        let matching = match cli.matching.as_deref().or(solver.matching.as_deref()) {
            Some(name) => parse_matching(name)?,
            None => defaults.matching,
        };

        Ok(RepairSettings {
            out_dir: cli
                .out_dir
                .clone()
                .or(output.out_dir)
                .unwrap_or(defaults.out_dir),
            strategies,
            fallback,
            matching,
            seed: cli.seed.or(solver.seed).unwrap_or(defaults.seed),
            report_violations: cli.report_violations || output.report_violations,
            write_relation: output.write_relation && !cli.no_write_relation,
        })
    }
}
