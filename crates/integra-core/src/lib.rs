//! Core data types for Integra.
//!
//! This crate defines the data that crosses the resolver's boundary: module
//! coordinates, module version records with their declared dependencies, the
//! read-only module catalog, and resolver configuration.
//!
//! This crate is intentionally free of resolution logic.

/// Default file name of the module catalog.
pub const DEFAULT_CATALOG_FILE: &str = "integra-catalog.toml";

/// Default file name of the configuration file.
pub const CONFIG_FILE: &str = "integra.toml";

pub mod catalog;
pub mod config;
pub mod coordinate;
pub mod module;
