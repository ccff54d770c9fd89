#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Apigen Merge Engine
//!
//! Deterministic, order-sensitive combination of plugin outputs. Files are
//! keyed on `path` and collisions are settled by a [`MergeStrategy`];
//! dependencies are keyed on package name and settled by semantic-version
//! precedence (see [`semver`]).
//!
//! "Later" always means "produced by a plugin that ran more recently": the
//! orchestrator folds outputs left to right in execution order.

use std::collections::HashMap;
use std::str::FromStr;

use ir::{CodeMetadata, Dependency, GeneratedCode, GeneratedFile};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod semver;

pub use semver::{merge_dependencies, SemVer, VersionError};

/// Errors raised while merging outputs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MergeError {
    /// Two outputs contain a file at the same path under [`MergeStrategy::Error`].
    #[error("file conflict: `{path}` is produced by more than one plugin")]
    FileConflict {
        /// The colliding path
        path: String,
    },
    /// Unknown strategy name.
    #[error("unknown merge strategy `{0}` (expected last-wins, first-wins or error)")]
    UnknownStrategy(String),
}

/// Convenient result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// How to settle two files at the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// The later file replaces the earlier one
    #[default]
    LastWins,
    /// The earlier file is kept
    FirstWins,
    /// Any collision is fatal
    Error,
}

impl MergeStrategy {
    /// Configuration spelling of the strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::LastWins => "last-wins",
            MergeStrategy::FirstWins => "first-wins",
            MergeStrategy::Error => "error",
        }
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for MergeStrategy {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "last-wins" => Ok(MergeStrategy::LastWins),
            "first-wins" => Ok(MergeStrategy::FirstWins),
            "error" => Ok(MergeStrategy::Error),
            other => Err(MergeError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Merge `later` into `earlier`.
///
/// Files unique to either side are carried through in first-seen order; a
/// replaced file keeps the position of the file it replaced. Dependencies go
/// through [`merge_dependencies`]. Metadata contributors are concatenated and
/// the later timestamp and extra keys win.
pub fn merge_code(
    earlier: GeneratedCode,
    later: GeneratedCode,
    strategy: MergeStrategy,
) -> Result<GeneratedCode> {
    Ok(GeneratedCode {
        files: merge_files(earlier.files, later.files, strategy)?,
        dependencies: merge_dependencies(earlier.dependencies, later.dependencies),
        metadata: merge_metadata(earlier.metadata, later.metadata),
    })
}

/// Fold any number of outputs left to right.
pub fn merge_all<I>(outputs: I, strategy: MergeStrategy) -> Result<GeneratedCode>
where
    I: IntoIterator<Item = GeneratedCode>,
{
    outputs
        .into_iter()
        .try_fold(GeneratedCode::default(), |acc, next| merge_code(acc, next, strategy))
}

/// Merge two file lists keyed on `path`.
pub fn merge_files(
    earlier: Vec<GeneratedFile>,
    later: Vec<GeneratedFile>,
    strategy: MergeStrategy,
) -> Result<Vec<GeneratedFile>> {
    let mut files = earlier;
    let mut index: HashMap<String, usize> =
        files.iter().enumerate().map(|(i, f)| (f.path.clone(), i)).collect();

    for file in later {
        match index.get(&file.path) {
            Some(&position) => match strategy {
                MergeStrategy::LastWins => {
                    debug!(path = %file.path, "file collision, keeping later file");
                    files[position] = file;
                }
                MergeStrategy::FirstWins => {
                    debug!(path = %file.path, "file collision, keeping earlier file");
                }
                MergeStrategy::Error => {
                    return Err(MergeError::FileConflict { path: file.path });
                }
            },
            None => {
                index.insert(file.path.clone(), files.len());
                files.push(file);
            }
        }
    }

    Ok(files)
}

fn merge_metadata(
    earlier: Option<CodeMetadata>,
    later: Option<CodeMetadata>,
) -> Option<CodeMetadata> {
    match (earlier, later) {
        (None, None) => None,
        (Some(only), None) | (None, Some(only)) => Some(only),
        (Some(mut earlier), Some(later)) => {
            earlier.contributors.extend(later.contributors);
            earlier.generated_at = later.generated_at.or(earlier.generated_at);
            earlier.extra.extend(later.extra);
            Some(earlier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> GeneratedFile { GeneratedFile::new(path, content) }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("last-wins".parse::<MergeStrategy>(), Ok(MergeStrategy::LastWins));
        assert_eq!("first-wins".parse::<MergeStrategy>(), Ok(MergeStrategy::FirstWins));
        assert_eq!("error".parse::<MergeStrategy>(), Ok(MergeStrategy::Error));
        assert!("newest".parse::<MergeStrategy>().is_err());
        assert_eq!(MergeStrategy::default(), MergeStrategy::LastWins);
    }

    #[test]
    fn test_replaced_file_keeps_position() {
        let merged = merge_files(
            vec![file("a.ts", "1"), file("b.ts", "1")],
            vec![file("c.ts", "2"), file("a.ts", "2")],
            MergeStrategy::LastWins,
        )
        .expect("merge");
        let order: Vec<_> = merged.iter().map(|f| (f.path.as_str(), f.content.as_str())).collect();
        assert_eq!(order, vec![("a.ts", "2"), ("b.ts", "1"), ("c.ts", "2")]);
    }

    #[test]
    fn test_unique_paths_never_conflict_under_error() {
        let merged = merge_files(vec![file("a.ts", "1")], vec![file("b.ts", "2")], MergeStrategy::Error)
            .expect("no conflict");
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_metadata_contributors_concatenate() {
        let a = CodeMetadata { contributors: vec!["rest".into()], ..Default::default() };
        let b = CodeMetadata { contributors: vec!["express".into()], ..Default::default() };
        let merged = merge_metadata(Some(a), Some(b)).expect("metadata");
        assert_eq!(merged.contributors, vec!["rest", "express"]);
    }
}
