//! Operation: select versions for root modules and print the outcome.
//!
//! Loads `integra.toml` and the module catalog, runs either the greedy
//! resolver or the backtracking solver, and renders the result as text or
//! JSON. Any conflict turns into a `Resolution` error after the report has
//! been printed, so the process exits with failure.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use integra_core::catalog::ModuleCatalog;
use integra_core::config::IntegraConfig;
use integra_core::coordinate::Coordinate;
use integra_core::module::ModuleRecord;
use integra_resolver::{DependencyResolver, ResolutionResult, Solution, VersionSolver};
use integra_util::errors::{IntegraError, IntegraResult};

/// Which engine answers the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// First-requestor-wins depth-first resolution.
    Greedy,
    /// Backtracking search over candidates.
    Backtracking,
}

/// Options for `integra resolve` and `integra solve`.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub catalog: PathBuf,
    pub config: PathBuf,
    pub json: bool,
}

impl ResolveOptions {
    /// Default catalog and config file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            catalog: dir.join(integra_core::DEFAULT_CATALOG_FILE),
            config: dir.join(integra_core::CONFIG_FILE),
            json: false,
        }
    }
}

/// Rendered outcome of one engine run.
#[derive(Debug, Clone)]
pub struct Report {
    pub success: bool,
    pub conflicts: usize,
    pub output: String,
}

/// Run the engine, print its report and fail if it found conflicts.
pub fn resolve(roots: &[String], engine: Engine, opts: &ResolveOptions) -> IntegraResult<()> {
    let report = run(roots, engine, opts)?;
    print!("{}", report.output);
    if !report.success {
        return Err(IntegraError::Resolution {
            message: format!("{} conflict(s) found", report.conflicts),
        }
        .into());
    }
    Ok(())
}

/// Load inputs, run the engine and render its result without printing.
pub fn run(roots: &[String], engine: Engine, opts: &ResolveOptions) -> IntegraResult<Report> {
    for root in roots {
        Coordinate::parse(root)?;
    }
    let config = IntegraConfig::load(&opts.config)?;
    let catalog = ModuleCatalog::from_path(&opts.catalog)?;

    match engine {
        Engine::Greedy => {
            let result = DependencyResolver::new(config.resolver).resolve(&catalog, roots);
            tracing::info!(
                "greedy resolution: {} selected, {} conflicts",
                result.selected_versions.len(),
                result.conflicts.len()
            );
            let output = if opts.json {
                to_json(&result)?
            } else {
                render_resolution(&result)
            };
            Ok(Report {
                success: result.is_success(),
                conflicts: result.conflicts.len(),
                output,
            })
        }
        Engine::Backtracking => {
            let solution = VersionSolver::new(config.solver).solve(&catalog, roots);
            tracing::info!(
                "backtracking solve: solution={}, {} selected",
                solution.has_solution,
                solution.selected_versions.len()
            );
            let output = if opts.json {
                to_json(&solution)?
            } else {
                render_solution(&solution)
            };
            Ok(Report {
                success: solution.has_solution,
                conflicts: solution.conflicts.len(),
                output,
            })
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> IntegraResult<String> {
    let mut json = serde_json::to_string_pretty(value).map_err(|e| IntegraError::Generic {
        message: format!("Failed to serialize result: {e}"),
    })?;
    json.push('\n');
    Ok(json)
}

/// Human-readable report for the greedy resolver.
pub fn render_resolution(result: &ResolutionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Selected {} module(s):", result.selected_versions.len());
    for selected in result.selected_versions.values() {
        let _ = writeln!(
            out,
            "  {} {} ({})",
            selected.coordinate, selected.version, selected.reason
        );
    }

    if !result.unresolved_dependencies.is_empty() {
        let unresolved: Vec<&str> = result
            .unresolved_dependencies
            .iter()
            .map(String::as_str)
            .collect();
        let _ = writeln!(out, "Unresolved: {}", unresolved.join(", "));
    }

    if result.conflicts.is_empty() {
        write_load_order(&mut out, &result.load_order);
    } else {
        let _ = writeln!(out, "{}", result.conflicts);
    }
    out
}

/// Human-readable report for the backtracking solver.
pub fn render_solution(solution: &Solution) -> String {
    let mut out = String::new();
    if !solution.has_solution {
        let _ = writeln!(out, "No solution.");
        let _ = writeln!(out, "{}", solution.conflicts);
        return out;
    }

    let _ = writeln!(out, "Solved {} module(s):", solution.selected_versions.len());
    for (coordinate, version) in &solution.selected_versions {
        let _ = writeln!(out, "  {coordinate} {version}");
    }
    match &solution.load_order {
        Some(order) => write_load_order(&mut out, order),
        None => {
            let _ = writeln!(out, "No load order: the selection contains a dependency cycle.");
        }
    }
    out
}

fn write_load_order(out: &mut String, order: &[ModuleRecord]) {
    let _ = writeln!(out, "Load order:");
    for (i, record) in order.iter().enumerate() {
        let _ = writeln!(out, "  {}. {record}", i + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
[[module]]
coordinate = "acme:app"
version = "1.0.0"
dependencies = ["acme:http@^1.0.0", { coordinate = "acme:log" }]

[[module]]
coordinate = "acme:http"
version = "1.1.0"
dependencies = ["acme:log@>=1.0.0"]

[[module]]
coordinate = "acme:http"
version = "2.0.0"

[[module]]
coordinate = "acme:log"
version = "1.3.0"
"#;

    fn setup(catalog: &str) -> (tempfile::TempDir, ResolveOptions) {
        let tmp = tempfile::tempdir().unwrap();
        let opts = ResolveOptions::in_dir(tmp.path());
        std::fs::write(&opts.catalog, catalog).unwrap();
        (tmp, opts)
    }

    fn roots(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn greedy_text_report_lists_load_order() {
        let (_tmp, opts) = setup(CATALOG);
        let report = run(&roots(&["acme:app"]), Engine::Greedy, &opts).unwrap();
        assert!(report.success);
        assert!(report.output.contains("acme:http 1.1.0 (satisfies constraint ^1.0.0)"));
        assert!(report.output.contains("1. acme:log@1.3.0"));
        assert!(report.output.contains("3. acme:app@1.0.0"));
    }

    #[test]
    fn solver_json_report_is_parseable() {
        let (_tmp, mut opts) = setup(CATALOG);
        opts.json = true;
        let report = run(&roots(&["acme:app"]), Engine::Backtracking, &opts).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report.output).unwrap();
        assert_eq!(value["has_solution"], true);
        assert_eq!(value["selected_versions"]["acme:http"], "1.1.0");
    }

    #[test]
    fn greedy_json_report_carries_conflicts() {
        let (_tmp, mut opts) = setup(CATALOG);
        opts.json = true;
        let report = run(&roots(&["acme:missing"]), Engine::Greedy, &opts).unwrap();
        assert!(!report.success);
        let value: serde_json::Value = serde_json::from_str(&report.output).unwrap();
        assert_eq!(value["conflicts"][0]["kind"], "MISSING_DEPENDENCY");
        assert_eq!(value["unresolved_dependencies"][0], "acme:missing");
    }

    #[test]
    fn conflicts_make_the_report_fail() {
        let (_tmp, opts) = setup(CATALOG);
        let report = run(&roots(&["acme:missing"]), Engine::Greedy, &opts).unwrap();
        assert!(!report.success);
        assert_eq!(report.conflicts, 1);
        assert!(report.output.contains("[MISSING_DEPENDENCY] acme:missing"));
        assert!(resolve(&roots(&["acme:missing"]), Engine::Greedy, &opts).is_err());
    }

    #[test]
    fn malformed_root_is_rejected_before_loading() {
        let tmp = tempfile::tempdir().unwrap();
        let opts = ResolveOptions::in_dir(tmp.path());
        let err = run(&roots(&["no-colon"]), Engine::Greedy, &opts).unwrap_err();
        assert!(err.to_string().contains("Malformed coordinate 'no-colon'"));
    }

    #[test]
    fn config_file_reaches_the_solver() {
        let (_tmp, opts) = setup(CATALOG);
        std::fs::write(&opts.config, "[solver]\nmax-steps = 1\n").unwrap();
        let report = run(&roots(&["acme:app"]), Engine::Backtracking, &opts).unwrap();
        assert!(!report.success);
        assert!(report.output.contains("SEARCH_EXHAUSTED"));
    }
}
