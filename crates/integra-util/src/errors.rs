use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Integra operations.
#[derive(Debug, Error, Diagnostic)]
pub enum IntegraError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A version string does not match `MAJOR.MINOR.PATCH[-pre][+build]`.
    #[error("Malformed version '{input}': {reason}")]
    #[diagnostic(help("Versions look like 1.4.2, 2.0.0-rc.1 or 1.0.0+build.7"))]
    MalformedVersion { input: String, reason: String },

    /// A constraint string is not part of the range grammar.
    #[error("Malformed version range '{input}': {reason}")]
    #[diagnostic(help(
        "Use *, an exact version, ^X.Y.Z, ~X.Y.Z, ~X, a comparison such as >=X.Y.Z, \
         or several clauses joined with commas"
    ))]
    MalformedRange { input: String, reason: String },

    /// Invalid `namespace:name` module coordinate.
    #[error("Malformed coordinate '{input}'")]
    #[diagnostic(help("Coordinates have the form namespace:name"))]
    MalformedCoordinate { input: String },

    /// The module catalog could not be read or parsed.
    #[error("Catalog error: {message}")]
    #[diagnostic(help("Check the catalog file for TOML syntax errors"))]
    Catalog { message: String },

    /// Invalid or unreadable configuration file.
    #[error("Config error: {message}")]
    Config { message: String },

    /// Dependency resolution did not produce a usable load order.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type IntegraResult<T> = miette::Result<T>;
