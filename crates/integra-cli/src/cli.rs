//! CLI argument definitions for Integra.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "integra",
    version,
    about = "Select compatible module versions from a catalog",
    long_about = "Integra picks one version per module coordinate so that every declared \
                  dependency constraint is met, and prints the order in which the selected \
                  modules can be loaded."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve roots greedily: the first requester of a module fixes its version
    Resolve(EngineArgs),

    /// Solve roots with backtracking over lower candidate versions
    Solve(EngineArgs),

    /// Lint the module catalog
    Check {
        /// Catalog file (default: integra-catalog.toml in this or a parent directory)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct EngineArgs {
    /// Root module coordinates (namespace:name)
    #[arg(required = true)]
    pub roots: Vec<String>,

    /// Catalog file (default: integra-catalog.toml in this or a parent directory)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Config file (default: integra.toml next to the catalog)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Parse command-line arguments into a [`Cli`] struct.
pub fn parse() -> Cli {
    Cli::parse()
}
