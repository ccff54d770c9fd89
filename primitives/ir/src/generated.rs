//! Generated output
//!
//! `GeneratedCode` is the universal currency between plugins: every generator,
//! adapter, auth, database and deploy plugin returns one, the merge engine
//! folds them together and the emitter writes the result.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A set of generated files plus the packages they need.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// Files keyed (by convention) on `path`
    pub files: Vec<GeneratedFile>,
    /// Package dependencies
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Provenance information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CodeMetadata>,
}

/// A single output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Relative POSIX-style path; identity key for merging
    pub path: String,
    /// Full file text (or base64 payload, see `encoding`)
    pub content: String,
    /// What kind of file this is
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    /// Per-file overwrite override; `Some(false)` keeps an existing file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    /// Content encoding (UTF-8 when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<FileEncoding>,
    /// Unix permission bits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

/// Category of generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum FileType {
    Source,
    Config,
    Test,
    Documentation,
    Migration,
    Other,
}

/// Encoding of `GeneratedFile::content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileEncoding {
    /// Plain text
    #[serde(rename = "utf-8")]
    Utf8,
    /// Binary payload encoded as standard base64
    #[serde(rename = "base64")]
    Base64,
}

/// A package dependency requested by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name; identity key for merging
    pub name: String,
    /// Semver range string, e.g. `^4.18.0`
    pub version: String,
    /// Which manifest section the package belongs to
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DependencyKind>,
    /// Development-only flag; an explicit `false` is sticky when merging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev: Option<bool>,
}

/// Manifest section of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum DependencyKind {
    Dependencies,
    DevDependencies,
    PeerDependencies,
}

/// Provenance of a `GeneratedCode` value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMetadata {
    /// When the output was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// Names of the plugins that contributed, in merge order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
    /// Anything else a plugin wants to record
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl GeneratedCode {
    /// Empty output
    pub fn new() -> Self { Self::default() }

    /// Add a file, builder style.
    pub fn with_file(mut self, file: GeneratedFile) -> Self {
        self.files.push(file);
        self
    }

    /// Add a dependency, builder style.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Look up a file by path.
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> { self.files.iter().find(|f| f.path == path) }

    /// Look up a dependency by package name.
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.name == name)
    }

    /// No files and no dependencies.
    pub fn is_empty(&self) -> bool { self.files.is_empty() && self.dependencies.is_empty() }

    /// Paths of all files in order.
    pub fn paths(&self) -> Vec<&str> { self.files.iter().map(|f| f.path.as_str()).collect() }

    /// Total number of text lines across all UTF-8 files.
    pub fn line_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.encoding != Some(FileEncoding::Base64))
            .map(|f| f.content.lines().count())
            .sum()
    }
}

impl GeneratedFile {
    /// A UTF-8 source file with no overrides.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            file_type: None,
            overwrite: None,
            encoding: None,
            mode: None,
        }
    }

    /// Set the file type, builder style.
    pub fn of_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }
}

impl Dependency {
    /// A runtime dependency.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into(), kind: None, dev: None }
    }

    /// A development-only dependency.
    pub fn dev(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind: Some(DependencyKind::DevDependencies),
            dev: Some(true),
        }
    }

    /// A peer dependency.
    pub fn peer(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind: Some(DependencyKind::PeerDependencies),
            dev: None,
        }
    }

    /// Whether the package is only needed during development.
    pub fn is_dev(&self) -> bool {
        self.dev.unwrap_or(self.kind == Some(DependencyKind::DevDependencies))
    }
}
