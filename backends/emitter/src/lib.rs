#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Apigen Emitter
//!
//! The single boundary through which generated output reaches the file
//! system. It creates directories, applies the overwrite policy, honours
//! dry-run, and reports per-file failures instead of aborting the batch.

use std::path::{Component, Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ir::{FileEncoding, GeneratedCode, GeneratedFile};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Batch-level emitter failures.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The output directory could not be created
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a single file was not written.
#[derive(Debug, Error)]
enum FileError {
    #[error("path is absolute or escapes the output directory")]
    UnsafePath,
    #[error("invalid base64 content: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// What to do when a target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    /// Replace existing files
    #[default]
    Always,
    /// Keep existing files
    Never,
    /// Replace only when the content differs
    IfChanged,
}

/// Emitter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Root every file path is resolved against
    pub output_dir: PathBuf,
    /// Policy for files that already exist
    pub overwrite: OverwritePolicy,
    /// Report without touching the disk
    pub dry_run: bool,
}

impl EmitOptions {
    /// Options writing into `output_dir` with the default policy
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into(), overwrite: OverwritePolicy::default(), dry_run: false }
    }
}

/// A file that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedWrite {
    /// Path as given in the generated output
    pub path: String,
    /// Human-readable cause
    pub error: String,
}

/// Outcome of one `write` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    /// Files written (or that would be written, in dry-run)
    pub written: Vec<PathBuf>,
    /// Existing files left untouched
    pub skipped: Vec<PathBuf>,
    /// Per-file failures
    pub failed: Vec<FailedWrite>,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl WriteReport {
    /// True when no file failed
    pub fn is_success(&self) -> bool { self.failed.is_empty() }
}

enum Outcome {
    Written(PathBuf),
    Skipped(PathBuf),
}

/// Writes `GeneratedCode` to disk.
#[derive(Debug, Clone)]
pub struct Emitter {
    options: EmitOptions,
}

impl Emitter {
    /// Create an emitter
    pub fn new(options: EmitOptions) -> Self { Self { options } }

    /// Settings in use
    pub fn options(&self) -> &EmitOptions { &self.options }

    /// Write every file of `code`. Only a failure to create the output
    /// directory aborts; everything else lands in the report.
    pub async fn write(&self, code: &GeneratedCode) -> Result<WriteReport, EmitError> {
        let mut report = WriteReport { dry_run: self.options.dry_run, ..Default::default() };

        if !self.options.dry_run {
            tokio::fs::create_dir_all(&self.options.output_dir).await.map_err(|source| {
                EmitError::OutputDir { path: self.options.output_dir.clone(), source }
            })?;
        }

        for file in &code.files {
            match self.write_file(file).await {
                Ok(Outcome::Written(path)) => report.written.push(path),
                Ok(Outcome::Skipped(path)) => {
                    debug!(path = %path.display(), "keeping existing file");
                    report.skipped.push(path);
                }
                Err(e) => {
                    warn!(path = %file.path, error = %e, "failed to write file");
                    report.failed.push(FailedWrite { path: file.path.clone(), error: e.to_string() });
                }
            }
        }

        info!(
            written = report.written.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            dry_run = report.dry_run,
            "emitted generated code"
        );
        Ok(report)
    }

    async fn write_file(&self, file: &GeneratedFile) -> Result<Outcome, FileError> {
        let target = resolve(&self.options.output_dir, &file.path)?;
        let contents = decode(file)?;

        if tokio::fs::try_exists(&target).await? {
            let keep = match file.overwrite {
                Some(overwrite) => !overwrite,
                None => match self.options.overwrite {
                    OverwritePolicy::Always => false,
                    OverwritePolicy::Never => true,
                    OverwritePolicy::IfChanged => tokio::fs::read(&target).await? == contents,
                },
            };
            if keep {
                return Ok(Outcome::Skipped(target));
            }
        }

        if self.options.dry_run {
            return Ok(Outcome::Written(target));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &contents).await?;
        apply_mode(&target, file.mode).await?;

        Ok(Outcome::Written(target))
    }
}

/// Join a relative generated path onto `root`, normalizing `.` and `..`
/// lexically. Anything that would land outside `root` is rejected.
fn resolve(root: &Path, path: &str) -> Result<PathBuf, FileError> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(FileError::UnsafePath);
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(FileError::UnsafePath),
        }
    }

    if parts.is_empty() {
        return Err(FileError::UnsafePath);
    }
    Ok(parts.into_iter().fold(root.to_path_buf(), |target, part| target.join(part)))
}

fn decode(file: &GeneratedFile) -> Result<Vec<u8>, FileError> {
    match file.encoding {
        Some(FileEncoding::Base64) => Ok(STANDARD.decode(file.content.trim())?),
        Some(FileEncoding::Utf8) | None => Ok(file.content.clone().into_bytes()),
    }
}

#[cfg(unix)]
async fn apply_mode(path: &Path, mode: Option<u32>) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(mode) => tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await,
        None => Ok(()),
    }
}

#[cfg(not(unix))]
async fn apply_mode(_path: &Path, _mode: Option<u32>) -> std::io::Result<()> { Ok(()) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_escapes() {
        let root = Path::new("/out");
        assert_eq!(resolve(root, "src/index.ts").expect("relative"), PathBuf::from("/out/src/index.ts"));
        assert_eq!(resolve(root, "./a.ts").expect("curdir"), PathBuf::from("/out/a.ts"));
        assert_eq!(resolve(root, "src/../a.ts").expect("normalized"), PathBuf::from("/out/a.ts"));
        assert_eq!(resolve(root, "src/gen/../api/x.ts").expect("normalized"), PathBuf::from("/out/src/api/x.ts"));
        assert!(matches!(resolve(root, "../a.ts"), Err(FileError::UnsafePath)));
        assert!(matches!(resolve(root, "src/.."), Err(FileError::UnsafePath)));
        assert!(matches!(resolve(root, "src/../../a.ts"), Err(FileError::UnsafePath)));
        assert!(matches!(resolve(root, "/etc/passwd"), Err(FileError::UnsafePath)));
        assert!(matches!(resolve(root, ""), Err(FileError::UnsafePath)));
    }

    #[test]
    fn test_decode_base64() {
        let mut file = GeneratedFile::new("logo.bin", "aGVsbG8=");
        file.encoding = Some(FileEncoding::Base64);
        assert_eq!(decode(&file).expect("decode"), b"hello");

        file.content = "not base64!".to_string();
        assert!(matches!(decode(&file), Err(FileError::Decode(_))));
    }
}
