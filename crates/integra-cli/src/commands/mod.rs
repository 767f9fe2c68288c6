//! Command dispatch and handler modules.

mod check;
mod resolve;

use std::path::PathBuf;

use miette::Result;
use tracing::debug;

use integra_util::errors::IntegraError;
use integra_util::fs::find_ancestor_with;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve(args) => resolve::exec(args, integra_ops::ops_resolve::Engine::Greedy),
        Command::Solve(args) => {
            resolve::exec(args, integra_ops::ops_resolve::Engine::Backtracking)
        }
        Command::Check { catalog } => check::exec(catalog),
    }
}

/// The explicit catalog path, or the nearest `integra-catalog.toml`.
fn locate_catalog(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        debug!("using catalog {} from --catalog", path.display());
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(IntegraError::Io)?;
    let root = find_ancestor_with(&cwd, integra_core::DEFAULT_CATALOG_FILE).ok_or_else(|| {
        IntegraError::Catalog {
            message: format!(
                "Could not find {} in current or parent directories",
                integra_core::DEFAULT_CATALOG_FILE
            ),
        }
    })?;
    let path = root.join(integra_core::DEFAULT_CATALOG_FILE);
    debug!("using catalog {}", path.display());
    Ok(path)
}
