//! Clap-free settings for the repair pipeline.

use camino::Utf8PathBuf;
use rsrepair_domain::MatchingMethod;
use rsrepair_types::RepairError;
use std::fmt;
use std::str::FromStr;

/// One end-to-end way of producing a representative repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    /// Decomposition planner with the configured fallback.
    LhsChain,
    /// Exact ILP over the whole relation with the constraint.
    GlobalIlp,
    LpGreedy,
    LpStratified,
    /// Decomposition planner that falls back to resolving one FD at a time.
    FdCleanser,
    /// Constraint-agnostic planner with a vertex-cover fallback, then post-clean.
    VcApprox,
    /// Constraint-agnostic exact ILP, then post-clean.
    IlpBaseline,
}

impl Strategy {
    pub const ALL: [Strategy; 7] = [
        Strategy::LhsChain,
        Strategy::GlobalIlp,
        Strategy::LpGreedy,
        Strategy::LpStratified,
        Strategy::FdCleanser,
        Strategy::VcApprox,
        Strategy::IlpBaseline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::LhsChain => "lhs-chain",
            Strategy::GlobalIlp => "global-ilp",
            Strategy::LpGreedy => "lp-greedy",
            Strategy::LpStratified => "lp-stratified",
            Strategy::FdCleanser => "fd-cleanser",
            Strategy::VcApprox => "vc-approx",
            Strategy::IlpBaseline => "ilp-baseline",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Strategy::LhsChain => "FD-decomposition planner with the configured fallback",
            Strategy::GlobalIlp => "exact integer program over the whole relation",
            Strategy::LpGreedy => "LP relaxation with min-degree greedy rounding",
            Strategy::LpStratified => "LP relaxation with representation-aware greedy rounding",
            Strategy::FdCleanser => "planner that resolves one FD at a time when stuck",
            Strategy::VcApprox => "constraint-agnostic vertex-cover approximation, then post-clean",
            Strategy::IlpBaseline => "constraint-agnostic exact repair, then post-clean",
        }
    }

    /// Baselines ignore the constraint until post-clean.
    pub fn is_rc_agnostic(&self) -> bool {
        matches!(self, Strategy::VcApprox | Strategy::IlpBaseline)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = RepairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Strategy::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| RepairError::invalid_input(format!("unknown strategy `{s}`")))
    }
}

/// Base solver the `lhs-chain` planner hands unreducible FD sets to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fallback {
    #[default]
    None,
    Ilp,
    LpGreedy,
    LpStratified,
    /// Deprecated: may reintroduce FD violations.
    LpUniform,
    FdCleanser,
}

impl Fallback {
    pub const ALL: [Fallback; 6] = [
        Fallback::None,
        Fallback::Ilp,
        Fallback::LpGreedy,
        Fallback::LpStratified,
        Fallback::LpUniform,
        Fallback::FdCleanser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Fallback::None => "none",
            Fallback::Ilp => "ilp",
            Fallback::LpGreedy => "lp-greedy",
            Fallback::LpStratified => "lp-stratified",
            Fallback::LpUniform => "lp-uniform",
            Fallback::FdCleanser => "fd-cleanser",
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Fallback {
    type Err = RepairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Fallback::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| RepairError::invalid_input(format!("unknown fallback `{s}`")))
    }
}

/// Parse `fractional` or `ilp`.
pub fn parse_matching(s: &str) -> Result<MatchingMethod, RepairError> {
    match s.trim() {
        "fractional" => Ok(MatchingMethod::FractionalElimination),
        "ilp" => Ok(MatchingMethod::Ilp),
        other => Err(RepairError::invalid_input(format!(
            "unknown matching method `{other}`"
        ))),
    }
}

/// Settings for the repair pipeline.
#[derive(Debug, Clone)]
pub struct RepairSettings {
    pub out_dir: Utf8PathBuf,

    // Solving
    pub strategies: Vec<Strategy>,
    pub fallback: Fallback,
    pub matching: MatchingMethod,
    pub seed: u64,

    // Output
    pub report_violations: bool,
    pub write_relation: bool,
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self {
            out_dir: Utf8PathBuf::from("artifacts/rsrepair"),
            strategies: vec![Strategy::LhsChain],
            fallback: Fallback::default(),
            matching: MatchingMethod::default(),
            seed: 42,
            report_violations: false,
            write_relation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_round_trip() {
        for s in Strategy::ALL {
            assert_eq!(s.as_str().parse::<Strategy>().unwrap(), s);
        }
        assert!("dp".parse::<Strategy>().is_err());
    }

    #[test]
    fn fallback_names_round_trip() {
        for f in Fallback::ALL {
            assert_eq!(f.as_str().parse::<Fallback>().unwrap(), f);
        }
    }

    #[test]
    fn only_baselines_ignore_the_constraint() {
        let agnostic: Vec<_> = Strategy::ALL.into_iter().filter(Strategy::is_rc_agnostic).collect();
        assert_eq!(agnostic, vec![Strategy::VcApprox, Strategy::IlpBaseline]);
    }

    #[test]
    fn matching_methods_parse() {
        assert_eq!(parse_matching("ilp").unwrap(), MatchingMethod::Ilp);
        assert_eq!(
            parse_matching(" fractional ").unwrap(),
            MatchingMethod::FractionalElimination
        );
        assert!(parse_matching("hungarian").is_err());
    }

    #[test]
    fn defaults_match_the_driver() {
        let s = RepairSettings::default();
        assert_eq!(s.seed, 42);
        assert_eq!(s.strategies, vec![Strategy::LhsChain]);
        assert_eq!(s.fallback, Fallback::None);
    }
}
