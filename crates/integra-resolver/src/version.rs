//! Semantic version values.
//!
//! Parsing and pre-release precedence come from the `semver` crate. Equality,
//! ordering and hashing skip build metadata, so `1.0.0+a` and
//! `1.0.0+b` are the same version.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use integra_util::errors::IntegraError;
use serde::{Deserialize, Serialize};

/// An immutable `MAJOR.MINOR.PATCH[-pre][+build]` version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(semver::Version);

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Parse a version string. All three numeric components are required and
    /// surrounding whitespace is rejected.
    pub fn parse(text: &str) -> Result<Self, IntegraError> {
        if text.is_empty() {
            return Err(IntegraError::MalformedVersion {
                input: text.to_string(),
                reason: "empty version string".to_string(),
            });
        }
        semver::Version::parse(text)
            .map(Self)
            .map_err(|e| IntegraError::MalformedVersion {
                input: text.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Pre-release text without the leading `-`, if any.
    pub fn pre_release(&self) -> Option<&str> {
        (!self.0.pre.is_empty()).then(|| self.0.pre.as_str())
    }

    /// Build metadata without the leading `+`, if any.
    pub fn build_metadata(&self) -> Option<&str> {
        (!self.0.build.is_empty()).then(|| self.0.build.as_str())
    }

    pub fn is_pre_release(&self) -> bool {
        !self.0.pre.is_empty()
    }

    /// `(X+1).0.0`, or `None` when `X` is already `u64::MAX`.
    pub fn next_major(&self) -> Option<Self> {
        Some(Self::new(self.major().checked_add(1)?, 0, 0))
    }

    /// `X.(Y+1).0`, or `None` when `Y` is already `u64::MAX`.
    pub fn next_minor(&self) -> Option<Self> {
        Some(Self::new(self.major(), self.minor().checked_add(1)?, 0))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .major
            .cmp(&other.0.major)
            .then(self.0.minor.cmp(&other.0.minor))
            .then(self.0.patch.cmp(&other.0.patch))
            // semver ranks an empty pre-release above any non-empty one
            .then_with(|| self.0.pre.cmp(&other.0.pre))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.major.hash(state);
        self.0.minor.hash(state);
        self.0.patch.hash(state);
        self.0.pre.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Version {
    type Err = IntegraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
