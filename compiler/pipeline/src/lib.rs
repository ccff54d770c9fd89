#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! High-level pipeline that turns a source schema into written API code
//! by driving the orchestrator through named, observable stages.
//!
//! ## Module Organization
//!
//! - `stage` - Stage names and per-stage timings
//! - `hooks` - Lifecycle hooks notified before, after and on failure of each stage
//! - `transform` - Schema and code transforms plus file filters
//! - `runner` - The `Pipeline` builder and its `run` entry points

use thiserror::Error;

/// Convenient result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Boxed error returned by hooks and transforms.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error from the orchestrator (parse, plugin, merge).
    #[error(transparent)]
    Orchestrator(#[from] orchestrator::OrchestratorError),
    /// The validate stage found errors.
    #[error("Validation failed: {}", errors.join("; "))]
    Validation {
        /// Every error reported
        errors: Vec<String>,
    },
    /// A schema or code transform failed.
    #[error("Transform `{name}` failed: {message}")]
    Transform {
        /// Name of the transform
        name: String,
        /// Rendered cause
        message: String,
    },
    /// The output directory could not be prepared.
    #[error(transparent)]
    Emit(#[from] emitter::EmitError),
    /// I/O error while reading the schema file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub mod hooks;
pub mod runner;
pub mod stage;
pub mod transform;

pub use hooks::PipelineHook;
pub use runner::{Pipeline, PipelineResult};
pub use stage::{Stage, StageTiming};
pub use transform::{code_fn, schema_fn, CodeTransform, FileFilter, SchemaTransform};
