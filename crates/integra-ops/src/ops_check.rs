//! Operation: lint a module catalog.
//!
//! Reports entries the engines would skip or trip over: malformed
//! coordinates, versions and constraints, dependencies on coordinates the
//! catalog does not know, and repeated `coordinate@version` entries.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use integra_core::catalog::ModuleCatalog;
use integra_core::coordinate::Coordinate;
use integra_resolver::{Version, VersionRange};
use integra_util::errors::{IntegraError, IntegraResult};

/// One problem found in a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    /// The `coordinate@version` entry the problem belongs to.
    pub entry: String,
    pub message: String,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entry, self.message)
    }
}

/// Load the catalog at `path`, print every issue, and fail if there are any.
pub fn check(path: &Path) -> IntegraResult<()> {
    let catalog = ModuleCatalog::from_path(path)?;
    println!(
        "Checking {} module version(s) in {}",
        catalog.len(),
        path.display()
    );

    let issues = lint(&catalog);
    if issues.is_empty() {
        println!("No problems found.");
        return Ok(());
    }

    for issue in &issues {
        println!("  {issue}");
    }
    Err(IntegraError::Catalog {
        message: format!("{} problem(s) found in {}", issues.len(), path.display()),
    }
    .into())
}

/// Every issue in `catalog`, in catalog order.
pub fn lint(catalog: &ModuleCatalog) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    let mut seen: HashSet<(&str, Version)> = HashSet::new();

    for record in catalog.records() {
        let entry = record.to_string();
        let mut report = |message: String| {
            issues.push(LintIssue {
                entry: entry.clone(),
                message,
            })
        };

        if let Err(e) = Coordinate::parse(&record.coordinate) {
            report(e.to_string());
        }
        match Version::parse(&record.version) {
            // Build metadata does not distinguish versions.
            Ok(version) => {
                if !seen.insert((record.coordinate.as_str(), version)) {
                    report("duplicate entry for this version".to_string());
                }
            }
            Err(e) => report(e.to_string()),
        }

        for dep in &record.dependencies {
            if let Err(e) = Coordinate::parse(&dep.coordinate) {
                report(format!("dependency {e}"));
            } else if !catalog.contains(&dep.coordinate) {
                report(format!("depends on {} which is not in the catalog", dep.coordinate));
            }
            if !dep.is_unconstrained() {
                if let Err(e) = VersionRange::parse(dep.constraint_text()) {
                    report(format!("dependency on {}: {e}", dep.coordinate));
                }
            }
        }
    }

    tracing::debug!("catalog lint found {} issue(s)", issues.len());
    issues
}
