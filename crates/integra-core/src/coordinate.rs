use std::fmt;

use integra_util::errors::IntegraError;

/// A `namespace:name` module coordinate.
///
/// The resolver engines key on the raw string; this type exists for
/// validating user input and catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub namespace: String,
    pub name: String,
}

impl Coordinate {
    /// Parse `"namespace:name"`. Both halves must be non-empty and contain
    /// no further `:` or whitespace.
    pub fn parse(s: &str) -> Result<Self, IntegraError> {
        let malformed = || IntegraError::MalformedCoordinate {
            input: s.to_string(),
        };
        let (namespace, name) = s.split_once(':').ok_or_else(malformed)?;
        let valid = |part: &str| {
            !part.is_empty() && !part.contains(':') && !part.chars().any(char::is_whitespace)
        };
        if !valid(namespace) || !valid(name) {
            return Err(malformed());
        }
        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}
