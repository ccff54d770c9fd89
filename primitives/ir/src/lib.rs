#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Apigen Intermediate Representation (IR)
//!
//! This crate defines the source-agnostic schema model that every parser
//! plugin produces and every generator plugin consumes, together with the
//! output currency (`GeneratedCode`) that flows between plugins and the
//! emitter.

pub mod generated;
pub mod schema_ir;
pub mod validation;

pub use generated::*;
pub use schema_ir::*;
pub use validation::ValidationResult;

use thiserror::Error;

/// Errors raised while loading or saving IR documents.
#[derive(Debug, Error)]
pub enum IrError {
    /// I/O failure while reading or writing an IR file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The document is not valid IR JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The document was written for another IR version.
    #[error("unsupported IR version `{found}` (expected `{expected}`)")]
    UnsupportedVersion {
        /// Version tag found in the document
        found: String,
        /// Version this crate reads
        expected: &'static str,
    },
}
