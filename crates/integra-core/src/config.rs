use serde::{Deserialize, Serialize};
use std::path::Path;

/// Resolver configuration loaded from `integra.toml`.
///
/// Every field has a default, so an empty or missing file is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegraConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub solver: SolverConfig,
}

/// Greedy resolver settings from `[resolver]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Report malformed dependency-edge constraints as conflicts instead of
    /// treating them as unconstrained.
    #[serde(default, rename = "strict-edge-constraints")]
    pub strict_edge_constraints: bool,

    #[serde(default, rename = "cycle-report")]
    pub cycle_report: CycleReport,
}

/// Which nodes are flagged once the selected graph is found to be cyclic.
///
/// This only drives the check on the finished selection. The depth-first pass
/// already reports every cycle among selected modules, with its path, and any
/// conflict skips that check, so today the setting never changes what
/// `resolve()` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleReport {
    /// Every node with both incoming and outgoing edges.
    #[default]
    Connected,
    /// Only nodes that lie on a cycle.
    OnCycle,
}

/// Backtracking solver settings from `[solver]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Upper bound on candidate attempts in one `solve()` call.
    #[serde(default = "default_max_steps", rename = "max-steps")]
    pub max_steps: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

fn default_max_steps() -> u64 {
    100_000
}

impl IntegraConfig {
    /// Load configuration from `path`, or return defaults if the file doesn't exist.
    pub fn load(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = integra_util::fs::read_text(path, "config")?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            integra_util::errors::IntegraError::Config {
                message: format!("Failed to parse config: {e}"),
            }
            .into()
        })
    }
}
