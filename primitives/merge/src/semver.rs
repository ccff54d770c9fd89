//! Semantic-version aware dependency merging.
//!
//! Comparison strips any leading range operator (`^`, `~`, `>=`, ...), reads
//! `major.minor.patch[-prerelease]` and compares numerically. The winning
//! entry keeps its own version string verbatim, operator included.

use std::cmp::Ordering;
use std::sync::OnceLock;

use ir::{Dependency, DependencyKind};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while parsing a version string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionError {
    /// The string does not start with a recognizable version.
    #[error("Invalid version format: {0}")]
    InvalidFormat(String),
    /// A numeric component does not fit.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// The comparable part of a semver range string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemVer {
    /// Major component
    pub major: u64,
    /// Minor component (0 when absent or a wildcard)
    pub minor: u64,
    /// Patch component (0 when absent or a wildcard)
    pub patch: u64,
    /// Prerelease tag after `-`
    pub prerelease: Option<String>,
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // The pattern is a literal; it cannot fail to compile.
        #[allow(clippy::unwrap_used)]
        Regex::new(
            r"^\s*(?:\^|~>|~|>=|<=|>|<|=)?\s*[vV]?(\d+)(?:\.(\d+|[xX*]))?(?:\.(\d+|[xX*]))?(?:-([0-9A-Za-z.-]+))?",
        )
        .unwrap()
    })
}

impl SemVer {
    /// Parse the first version in a range string such as `^4.18.0`,
    /// `~1.2`, `>=2.0.0-rc.1 <3` or `v1`.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let caps = version_regex()
            .captures(s)
            .ok_or_else(|| VersionError::InvalidFormat(s.to_string()))?;

        let component = |index: usize| -> Result<u64, VersionError> {
            match caps.get(index).map(|m| m.as_str()) {
                None | Some("x") | Some("X") | Some("*") => Ok(0),
                Some(digits) => digits
                    .parse()
                    .map_err(|e: std::num::ParseIntError| VersionError::Parse(e.to_string())),
            }
        };

        Ok(Self {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
            prerelease: caps.get(4).map(|m| m.as_str().to_string()),
        })
    }

    /// Whether this is a release (no prerelease tag).
    pub fn is_release(&self) -> bool { self.prerelease.is_none() }

    /// Precedence: numeric tuple first, then a release outranks a
    /// prerelease. Two prereleases with equal tuples compare equal.
    pub fn precedence(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| self.is_release().cmp(&other.is_release()))
    }
}

/// Merge two dependency lists keyed on package name.
///
/// Unique entries pass through unchanged, in first-seen order. On a name
/// clash the entry with strictly higher precedence wins; ties and unparseable
/// versions keep the existing entry. An explicit `dev: false` from either
/// side is sticky.
pub fn merge_dependencies(existing: Vec<Dependency>, incoming: Vec<Dependency>) -> Vec<Dependency> {
    let mut merged = existing;

    for dependency in incoming {
        match merged.iter().position(|d| d.name == dependency.name) {
            Some(position) => {
                let resolved = resolve(&merged[position], dependency);
                merged[position] = resolved;
            }
            None => merged.push(dependency),
        }
    }

    merged
}

fn resolve(existing: &Dependency, incoming: Dependency) -> Dependency {
    let force_runtime = existing.dev == Some(false) || incoming.dev == Some(false);

    let mut winner = if outranks(&incoming.version, &existing.version) {
        debug!(
            package = %incoming.name,
            from = %existing.version,
            to = %incoming.version,
            "dependency version raised"
        );
        incoming
    } else {
        existing.clone()
    };

    if force_runtime {
        winner.dev = Some(false);
        if winner.kind == Some(DependencyKind::DevDependencies) {
            winner.kind = Some(DependencyKind::Dependencies);
        }
    }

    winner
}

fn outranks(candidate: &str, current: &str) -> bool {
    match (SemVer::parse(candidate), SemVer::parse(current)) {
        (Ok(candidate), Ok(current)) => candidate.precedence(&current) == Ordering::Greater,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_operators() {
        for input in ["^4.18.2", "~4.18.2", ">=4.18.2", "=4.18.2", "v4.18.2", "4.18.2", "  ^ 4.18.2"] {
            let v = SemVer::parse(input).expect(input);
            assert_eq!((v.major, v.minor, v.patch), (4, 18, 2), "{}", input);
        }
    }

    #[test]
    fn test_parse_partial_and_wildcards() {
        let v = SemVer::parse("^2").expect("major only");
        assert_eq!((v.major, v.minor, v.patch), (2, 0, 0));
        let v = SemVer::parse("1.x").expect("wildcard");
        assert_eq!((v.major, v.minor, v.patch), (1, 0, 0));
    }

    #[test]
    fn test_parse_prerelease_and_range() {
        let v = SemVer::parse(">=2.0.0-rc.1 <3.0.0").expect("range");
        assert_eq!(v.prerelease.as_deref(), Some("rc.1"));
        assert!(!v.is_release());
    }

    #[test]
    fn test_parse_rejects_tags() {
        assert!(SemVer::parse("latest").is_err());
        assert!(SemVer::parse("workspace:*").is_err());
    }

    #[test]
    fn test_precedence_is_numeric_not_lexical() {
        let a = SemVer::parse("1.10.0").expect("a");
        let b = SemVer::parse("1.9.0").expect("b");
        assert_eq!(a.precedence(&b), Ordering::Greater);
    }

    #[test]
    fn test_prereleases_with_equal_tuples_are_equal() {
        let a = SemVer::parse("1.0.0-alpha").expect("a");
        let b = SemVer::parse("1.0.0-beta").expect("b");
        assert_eq!(a.precedence(&b), Ordering::Equal);
    }

    #[test]
    fn test_unparseable_keeps_existing() {
        let merged = merge_dependencies(
            vec![Dependency::new("react", "latest")],
            vec![Dependency::new("react", "^18.2.0")],
        );
        assert_eq!(merged[0].version, "latest");
    }
}
