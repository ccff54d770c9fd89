// SPDX-License-Identifier: CC0-1.0

//! Apigen umbrella crate.
//!
//! Re-exports the workspace member crates so an embedding application can
//! depend on a single crate. All functional code lives in the members under
//! `primitives`, `compiler` and `backends`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![warn(deprecated_in_future)]
#![doc(test(attr(warn(unused))))]

pub use apigen_config as config;
pub use apigen_emitter as emitter;
pub use apigen_ir as ir;
pub use apigen_logging as logging;
pub use apigen_merge as merge;
pub use apigen_orchestrator as orchestrator;
pub use apigen_pipeline as pipeline;
pub use apigen_plugins as plugins;

pub use config::Config;
pub use orchestrator::Orchestrator;
pub use pipeline::{Pipeline, PipelineResult};
pub use plugins::{AnyPlugin, PluginRegistry};

/// Miscellaneous metadata about the Apigen workspace.
pub mod apigen_meta {
    /// Version string for the umbrella crate, as reported by Cargo.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
