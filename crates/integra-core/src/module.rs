use std::fmt;

use serde::{Deserialize, Serialize};

/// Constraint text meaning "any version".
pub const ANY_CONSTRAINT: &str = "*";

/// One published version of a module together with its declared dependencies.
///
/// Records come from the catalog verbatim; the version and constraint strings
/// are only parsed by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub coordinate: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyDecl>,
}

impl ModuleRecord {
    pub fn new(coordinate: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            coordinate: coordinate.into(),
            version: version.into(),
            dependencies: Vec::new(),
        }
    }

    /// Builder-style helper that appends a dependency declaration.
    pub fn with_dependency(mut self, coordinate: &str, constraint: Option<&str>) -> Self {
        self.dependencies.push(DependencyDecl {
            coordinate: coordinate.to_string(),
            constraint: constraint.map(str::to_string),
        });
        self
    }
}

impl fmt::Display for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.coordinate, self.version)
    }
}

/// A declared dependency edge: target coordinate plus an optional constraint.
///
/// In TOML it is written either as a short string `"coordinate[@constraint]"`
/// or as a table with `coordinate` and optional `constraint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DependencySpec")]
pub struct DependencyDecl {
    pub coordinate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

impl DependencyDecl {
    /// Parse the short form `"coordinate[@constraint]"`.
    pub fn parse(s: &str) -> Self {
        match s.split_once('@') {
            Some((coordinate, constraint)) => {
                let constraint = constraint.trim();
                Self {
                    coordinate: coordinate.trim().to_string(),
                    constraint: (!constraint.is_empty()).then(|| constraint.to_string()),
                }
            }
            None => Self {
                coordinate: s.trim().to_string(),
                constraint: None,
            },
        }
    }

    /// Whether the declaration places no restriction on the version.
    pub fn is_unconstrained(&self) -> bool {
        match self.constraint.as_deref().map(str::trim) {
            None | Some("") | Some(ANY_CONSTRAINT) => true,
            Some(_) => false,
        }
    }

    /// Constraint text, with `*` standing in for an absent constraint.
    pub fn constraint_text(&self) -> &str {
        self.constraint.as_deref().unwrap_or(ANY_CONSTRAINT)
    }
}

impl fmt::Display for DependencyDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(c) => write!(f, "{}@{}", self.coordinate, c),
            None => f.write_str(&self.coordinate),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DependencySpec {
    Short(String),
    Detailed {
        coordinate: String,
        #[serde(default)]
        constraint: Option<String>,
    },
}

impl From<DependencySpec> for DependencyDecl {
    fn from(spec: DependencySpec) -> Self {
        match spec {
            DependencySpec::Short(s) => DependencyDecl::parse(&s),
            DependencySpec::Detailed {
                coordinate,
                constraint,
            } => DependencyDecl {
                coordinate,
                constraint,
            },
        }
    }
}
