//! Resolution conflicts and their operator-facing rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a coordinate could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// No version of the coordinate exists in the catalog.
    MissingDependency,
    /// Versions exist but none satisfies the constraint(s).
    UnsatisfiedConstraint,
    /// An already-selected version violates a later requester's constraint.
    VersionConflict,
    /// The coordinate takes part in a dependency cycle.
    CircularDependency,
    /// The solver ran out of its step budget.
    SearchExhausted,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictKind::MissingDependency => "MISSING_DEPENDENCY",
            ConflictKind::UnsatisfiedConstraint => "UNSATISFIED_CONSTRAINT",
            ConflictKind::VersionConflict => "VERSION_CONFLICT",
            ConflictKind::CircularDependency => "CIRCULAR_DEPENDENCY",
            ConflictKind::SearchExhausted => "SEARCH_EXHAUSTED",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured, user-facing explanation of a resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub coordinate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Conflict {
    pub fn new(kind: ConflictKind, coordinate: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            coordinate: coordinate.to_string(),
            constraint: None,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// The catalog has no versions of `coordinate`.
    pub fn missing(coordinate: &str, required_by: Option<&str>) -> Self {
        let message = match required_by {
            Some(parent) => format!("module not found in catalog (required by {parent})"),
            None => "module not found in catalog".to_string(),
        };
        Self::new(ConflictKind::MissingDependency, coordinate, message).with_suggestion(format!(
            "publish {coordinate} to the catalog or remove the dependency on it"
        ))
    }

    /// The catalog lists `entries` records for `coordinate` but none has a
    /// readable version.
    pub fn unreadable(coordinate: &str, entries: usize) -> Self {
        Self::new(
            ConflictKind::MissingDependency,
            coordinate,
            format!("none of the {entries} catalog entries has a readable version"),
        )
        .with_suggestion(format!(
            "fix the version strings of {coordinate} in the catalog (see `integra check`)"
        ))
    }

    /// None of `available` satisfies `constraint`.
    pub fn unsatisfied(coordinate: &str, constraint: &str, available: &[String]) -> Self {
        let available = if available.is_empty() {
            "none".to_string()
        } else {
            available.join(", ")
        };
        Self::new(
            ConflictKind::UnsatisfiedConstraint,
            coordinate,
            format!("no available version satisfies {constraint} (available: {available})"),
        )
        .with_constraint(constraint)
        .with_suggestion(format!(
            "relax the constraint or publish a version of {coordinate} matching {constraint}"
        ))
    }

    /// `selected` was chosen first, and `requester` now asks for `constraint`.
    pub fn version_mismatch(
        coordinate: &str,
        constraint: &str,
        selected: &str,
        requester: &str,
    ) -> Self {
        Self::new(
            ConflictKind::VersionConflict,
            coordinate,
            format!("{requester} requires {constraint} but {selected} is already selected"),
        )
        .with_constraint(constraint)
        .with_suggestion(format!(
            "align the constraints on {coordinate} so one version satisfies every requester"
        ))
    }

    /// `coordinate` depends on itself through `path`.
    pub fn circular(coordinate: &str, path: &[&str]) -> Self {
        let message = if path.is_empty() {
            "module takes part in a dependency cycle".to_string()
        } else {
            format!("dependency cycle: {}", path.join(" -> "))
        };
        Self::new(ConflictKind::CircularDependency, coordinate, message)
            .with_suggestion("remove one of the dependencies that closes the cycle")
    }

    /// The solver gave up after `steps` candidate attempts.
    pub fn exhausted(coordinate: &str, steps: u64) -> Self {
        Self::new(
            ConflictKind::SearchExhausted,
            coordinate,
            format!("search budget of {steps} steps exhausted while selecting a version"),
        )
        .with_suggestion("raise [solver] max-steps or narrow the constraints")
    }
}

/// Renders `[type] coordinate: message -> suggestion`.
impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.coordinate, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " -> {suggestion}")?;
        }
        Ok(())
    }
}

/// All conflicts recorded during one resolution, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: Conflict) {
        tracing::debug!("conflict: {conflict}");
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Conflict> {
        self.conflicts.iter()
    }

    pub fn of_kind(&self, kind: ConflictKind) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(move |c| c.kind == kind)
    }
}

impl<'a> IntoIterator for &'a ConflictReport {
    type Item = &'a Conflict;
    type IntoIter = std::slice::Iter<'a, Conflict>;

    fn into_iter(self) -> Self::IntoIter {
        self.conflicts.iter()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No conflicts.");
        }
        writeln!(f, "Conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report() {
        let report = ConflictReport::new();
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
        assert_eq!(report.to_string(), "No conflicts.");
    }

    #[test]
    fn renders_operator_template() {
        let conflict = Conflict::new(ConflictKind::MissingDependency, "acme:db", "not found")
            .with_suggestion("add it");
        assert_eq!(conflict.to_string(), "[MISSING_DEPENDENCY] acme:db: not found -> add it");
    }

    #[test]
    fn omits_absent_suggestion() {
        let conflict = Conflict::new(ConflictKind::VersionConflict, "acme:db", "clash");
        assert_eq!(conflict.to_string(), "[VERSION_CONFLICT] acme:db: clash");
    }

    #[test]
    fn unsatisfied_lists_available_versions() {
        let conflict = Conflict::unsatisfied("acme:b", ">=2.0.0", &["1.0.0".to_string()]);
        assert_eq!(conflict.kind, ConflictKind::UnsatisfiedConstraint);
        assert_eq!(conflict.constraint.as_deref(), Some(">=2.0.0"));
        assert!(conflict.message.contains("available: 1.0.0"));
    }

    #[test]
    fn circular_shows_path() {
        let conflict = Conflict::circular("acme:a", &["acme:a", "acme:b", "acme:a"]);
        assert!(conflict.message.contains("acme:a -> acme:b -> acme:a"));
    }

    #[test]
    fn report_with_conflicts() {
        let mut report = ConflictReport::new();
        report.add(Conflict::missing("acme:db", Some("acme:app")));
        report.add(Conflict::exhausted("acme:x", 10));
        assert_eq!(report.len(), 2);
        assert_eq!(report.of_kind(ConflictKind::SearchExhausted).count(), 1);
        let s = report.to_string();
        assert!(s.starts_with("Conflicts (2):"));
        assert!(s.contains("[MISSING_DEPENDENCY] acme:db: module not found in catalog (required by acme:app)"));
    }

    #[test]
    fn kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&ConflictKind::CircularDependency).unwrap();
        assert_eq!(json, "\"CIRCULAR_DEPENDENCY\"");
    }
}
