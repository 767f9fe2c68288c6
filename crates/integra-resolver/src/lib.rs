//! Module version resolution engine: semantic versions and constraint ranges,
//! the dependency graph, a greedy first-match resolver, and a backtracking
//! version solver.
//!
//! Everything here is synchronous and free of I/O. Engines keep all working
//! state local to a single call, so one instance can be shared across threads.

pub mod conflict;
pub mod graph;
pub mod range;
pub mod resolver;
pub mod solver;
pub mod version;

pub use conflict::{Conflict, ConflictKind, ConflictReport};
pub use graph::DependencyGraph;
pub use range::VersionRange;
pub use resolver::{DependencyResolver, ResolutionResult, SelectedVersion};
pub use solver::{Solution, VersionSolver};
pub use version::Version;
