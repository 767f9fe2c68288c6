//! Version constraint ranges.
//!
//! Supported forms:
//!
//! | Form                         | Meaning                     |
//! |------------------------------|-----------------------------|
//! | `*` or empty                 | any version                 |
//! | `X.Y.Z`                      | exactly `X.Y.Z`             |
//! | `^X.Y.Z`                     | `>=X.Y.Z, <(X+1).0.0`       |
//! | `~X.Y.Z`                     | `>=X.Y.Z, <X.(Y+1).0`       |
//! | `~X`                         | `>=X.0.0, <(X+1).0.0`       |
//! | `>=`, `<=`, `>`, `<`, `=`    | single comparison           |
//! | `A, B, ...`                  | every clause must hold      |

use std::fmt;
use std::str::FromStr;

use integra_util::errors::IntegraError;

use crate::version::Version;

/// Comparison operator of a single clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
        }
    }
}

/// One `op version` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    pub op: Op,
    pub version: Version,
}

impl Comparator {
    fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    pub fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Eq => version == &self.version,
            Op::Gt => version > &self.version,
            Op::Ge => version >= &self.version,
            Op::Lt => version < &self.version,
            Op::Le => version <= &self.version,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// An immutable predicate over versions: the conjunction of its comparators.
///
/// A range with no comparators matches every version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    source: String,
    comparators: Vec<Comparator>,
}

impl VersionRange {
    /// The range that matches every version.
    pub fn any() -> Self {
        Self {
            source: "*".to_string(),
            comparators: Vec::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, IntegraError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self::any());
        }

        let mut comparators = Vec::new();
        for clause in trimmed.split(',') {
            let clause = clause.trim();
            if clause.is_empty() {
                return Err(IntegraError::MalformedRange {
                    input: text.to_string(),
                    reason: "empty clause between commas".to_string(),
                });
            }
            parse_clause(clause, &mut comparators).map_err(|reason| {
                IntegraError::MalformedRange {
                    input: text.to_string(),
                    reason,
                }
            })?;
        }

        Ok(Self {
            source: trimmed.to_string(),
            comparators,
        })
    }

    /// Whether `version` satisfies every clause.
    pub fn satisfies(&self, version: &Version) -> bool {
        self.comparators.iter().all(|c| c.matches(version))
    }

    /// The highest candidate satisfying the range, or `None`.
    ///
    /// `candidates` need not be sorted. Among equal versions the first wins.
    pub fn max_satisfying<'a, I>(&self, candidates: I) -> Option<&'a Version>
    where
        I: IntoIterator<Item = &'a Version>,
    {
        candidates
            .into_iter()
            .filter(|v| self.satisfies(v))
            .fold(None, |best, v| match best {
                Some(b) if b >= v => Some(b),
                _ => Some(v),
            })
    }

    /// A range satisfied exactly when both `self` and `other` are.
    pub fn intersect(&self, other: &VersionRange) -> VersionRange {
        match (self.is_any(), other.is_any()) {
            (true, _) => other.clone(),
            (_, true) => self.clone(),
            _ => VersionRange {
                source: format!("{}, {}", self.source, other.source),
                comparators: self
                    .comparators
                    .iter()
                    .chain(&other.comparators)
                    .cloned()
                    .collect(),
            },
        }
    }

    pub fn is_any(&self) -> bool {
        self.comparators.is_empty()
    }

    pub fn comparators(&self) -> &[Comparator] {
        &self.comparators
    }

    /// The text this range was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn parse_clause(clause: &str, out: &mut Vec<Comparator>) -> Result<(), String> {
    if clause == "*" {
        return Ok(());
    }

    if let Some(rest) = clause.strip_prefix('^') {
        let base = parse_version(rest)?;
        let upper = base.next_major().ok_or_else(|| no_upper_bound(clause))?;
        out.push(Comparator::new(Op::Ge, base));
        out.push(Comparator::new(Op::Lt, upper));
        return Ok(());
    }

    if let Some(rest) = clause.strip_prefix('~') {
        let rest = rest.trim();
        if let Ok(major) = rest.parse::<u64>() {
            out.push(Comparator::new(Op::Ge, Version::new(major, 0, 0)));
            let upper = major.checked_add(1).ok_or_else(|| no_upper_bound(clause))?;
            out.push(Comparator::new(Op::Lt, Version::new(upper, 0, 0)));
            return Ok(());
        }
        let base = parse_version(rest)?;
        let upper = base.next_minor().ok_or_else(|| no_upper_bound(clause))?;
        out.push(Comparator::new(Op::Ge, base));
        out.push(Comparator::new(Op::Lt, upper));
        return Ok(());
    }

    // Two-character operators must be tried before their one-character prefixes.
    for (prefix, op) in [
        (">=", Op::Ge),
        ("<=", Op::Le),
        (">", Op::Gt),
        ("<", Op::Lt),
        ("=", Op::Eq),
    ] {
        if let Some(rest) = clause.strip_prefix(prefix) {
            out.push(Comparator::new(op, parse_version(rest)?));
            return Ok(());
        }
    }

    out.push(Comparator::new(Op::Eq, parse_version(clause)?));
    Ok(())
}

fn no_upper_bound(clause: &str) -> String {
    format!("'{clause}' has no representable upper bound")
}

fn parse_version(text: &str) -> Result<Version, String> {
    Version::parse(text.trim()).map_err(|e| match e {
        IntegraError::MalformedVersion { input, reason } => format!("'{input}': {reason}"),
        other => other.to_string(),
    })
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for VersionRange {
    type Err = IntegraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn r(s: &str) -> VersionRange {
        VersionRange::parse(s).unwrap()
    }

    #[test]
    fn star_and_empty_match_everything() {
        for text in ["*", "", "   "] {
            let range = r(text);
            assert!(range.is_any());
            assert!(range.satisfies(&v("0.0.1")));
            assert!(range.satisfies(&v("99.0.0-alpha")));
        }
    }

    #[test]
    fn exact_match_only() {
        let range = r("1.5.0");
        assert!(range.satisfies(&v("1.5.0")));
        assert!(!range.satisfies(&v("1.4.9")));
        assert!(!range.satisfies(&v("1.5.1")));
        assert!(!range.satisfies(&v("1.5.0-rc.1")));
    }

    #[test]
    fn caret_spans_major() {
        let range = r("^1.2.0");
        assert!(!range.satisfies(&v("1.1.9")));
        assert!(range.satisfies(&v("1.2.0")));
        assert!(range.satisfies(&v("1.9.9")));
        assert!(!range.satisfies(&v("2.0.0")));
    }

    #[test]
    fn caret_on_zero_major_still_spans_major() {
        let range = r("^0.2.0");
        assert!(range.satisfies(&v("0.9.0")));
        assert!(!range.satisfies(&v("1.0.0")));
    }

    #[test]
    fn tilde_spans_minor() {
        let range = r("~1.2.0");
        assert!(range.satisfies(&v("1.2.0")));
        assert!(range.satisfies(&v("1.2.99")));
        assert!(!range.satisfies(&v("1.3.0")));
        assert!(!range.satisfies(&v("1.1.0")));
    }

    #[test]
    fn tilde_major_only() {
        let range = r("~2");
        assert!(range.satisfies(&v("2.0.0")));
        assert!(range.satisfies(&v("2.7.1")));
        assert!(!range.satisfies(&v("3.0.0")));
        assert!(!range.satisfies(&v("1.9.9")));
    }

    #[test]
    fn comparison_operators() {
        assert!(r(">=1.1.0").satisfies(&v("1.1.0")));
        assert!(!r(">1.1.0").satisfies(&v("1.1.0")));
        assert!(r("<=1.1.0").satisfies(&v("1.1.0")));
        assert!(!r("<1.1.0").satisfies(&v("1.1.0")));
        assert!(r("=1.1.0").satisfies(&v("1.1.0")));
        assert!(!r("=1.1.0").satisfies(&v("1.1.1")));
    }

    #[test]
    fn operator_may_be_followed_by_space() {
        assert!(r(">= 1.0.0").satisfies(&v("1.0.0")));
        assert!(r(" 1.0.0 ").satisfies(&v("1.0.0")));
    }

    #[test]
    fn comma_is_conjunction() {
        let range = r(">=1.0.0, <1.5.0");
        assert!(range.satisfies(&v("1.0.0")));
        assert!(range.satisfies(&v("1.4.9")));
        assert!(!range.satisfies(&v("1.5.0")));
        assert!(!range.satisfies(&v("0.9.0")));
        assert_eq!(range.comparators().len(), 2);
    }

    #[test]
    fn build_metadata_never_changes_satisfies() {
        for text in ["1.0.0", "^1.0.0", "~1.0.0", "<=1.0.0", ">=1.0.0"] {
            let range = r(text);
            assert_eq!(
                range.satisfies(&v("1.0.0")),
                range.satisfies(&v("1.0.0+build.42")),
                "{text}"
            );
        }
    }

    #[test]
    fn max_satisfying_ignores_input_order() {
        let candidates = vec![v("1.2.0"), v("2.0.0"), v("1.0.0"), v("1.1.0")];
        assert_eq!(r(">=1.1.0, <2.0.0").max_satisfying(&candidates), Some(&v("1.2.0")));
        assert_eq!(r("*").max_satisfying(&candidates), Some(&v("2.0.0")));
        assert_eq!(r(">=3.0.0").max_satisfying(&candidates), None);
    }

    #[test]
    fn intersect_combines_clauses() {
        let both = r(">=2.0.0").intersect(&r("^1.0.0"));
        assert_eq!(both.to_string(), ">=2.0.0, ^1.0.0");
        assert!(!both.satisfies(&v("1.5.0")));
        assert!(!both.satisfies(&v("2.0.0")));
        assert_eq!(VersionRange::any().intersect(&r("~1.2.0")), r("~1.2.0"));
    }

    #[test]
    fn display_keeps_source_text() {
        assert_eq!(r("^1.2.0").to_string(), "^1.2.0");
        assert_eq!(r("").to_string(), "*");
    }

    #[test]
    fn upper_bound_overflow_is_malformed() {
        for bad in [
            "^18446744073709551615.0.0",
            "~18446744073709551615",
            "~3.18446744073709551615.0",
        ] {
            let err = VersionRange::parse(bad).unwrap_err();
            assert!(
                err.to_string().contains("no representable upper bound"),
                "{bad}: {err}"
            );
        }
        let top = r("^18446744073709551614.0.0");
        assert!(top.satisfies(&Version::new(u64::MAX - 1, 7, 0)));
        assert!(!top.satisfies(&Version::new(u64::MAX, 0, 0)));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["^", "~1.2", "^1.x", ">=", "1.0", ">=1.0.0,", "abc", "=>1.0.0", "~x"] {
            let err = VersionRange::parse(bad).unwrap_err();
            assert!(
                matches!(err, IntegraError::MalformedRange { .. }),
                "{bad} should be malformed"
            );
        }
    }
}
