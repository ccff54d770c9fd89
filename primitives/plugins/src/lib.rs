#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Apigen Plugins
//!
//! This crate defines the six capability contracts through which Apigen is
//! extended: parsers turn source text into [`SchemaIR`], generators emit API
//! code from it, an adapter wraps that code for one web framework, auth and
//! database plugins add their own files, and deploy plugins produce manifests
//! from everything generated before them.
//!
//! Every `generate`/`adapt` call receives its input by shared reference and
//! returns a fresh [`GeneratedCode`], so a plugin cannot mutate what it was
//! given.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use ir::{Dependency, GeneratedCode, SchemaIR, ValidationResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod options;
pub mod registry;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use options::*;
pub use registry::PluginRegistry;

/// Plugin error type
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PluginError {
    /// Source text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
    /// Plugin execution failed
    #[error("Execution failed: {0}")]
    Execution(String),
    /// Plugin configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Plugin dependency error
    #[error("Dependency error: {0}")]
    Dependency(String),
    /// The plugin does not implement the requested capability
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Convenient result type for plugin calls.
pub type Result<T> = std::result::Result<T, PluginError>;

/// Identity and metadata shared by every plugin kind.
pub trait Plugin: Send + Sync {
    /// Plugin name, unique per kind within a registry
    fn name(&self) -> &str;

    /// Plugin version
    fn version(&self) -> &str;

    /// Plugin description
    fn description(&self) -> &str { "" }

    /// Ordering among plugins of the same kind; higher runs later and wins
    /// file collisions under the default merge strategy.
    fn priority(&self) -> i32 { 0 }

    /// Packages the generated code needs
    fn dependencies(&self) -> Vec<Dependency> { Vec::new() }

    /// Packages the consumer is expected to provide
    fn peer_dependencies(&self) -> Vec<Dependency> { Vec::new() }
}

/// Turns source schema text into IR.
#[async_trait]
pub trait Parser: Plugin {
    /// File extensions (without the dot) this parser recognizes
    fn extensions(&self) -> &[&str];

    /// Cheap sniff; must not fail.
    fn can_parse(&self, _input: &SourceInput, path: Option<&Path>) -> bool {
        path.and_then(|p| p.extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions().iter().any(|known| known.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Parse the input. Malformed input fails; a partial IR is never returned.
    async fn parse(&self, input: &SourceInput, options: &ParseOptions) -> Result<SchemaIR>;

    /// Report problems in the input without failing.
    fn validate(&self, _input: &SourceInput) -> ValidationResult { ValidationResult::ok() }
}

/// Emits API code (routes, resolvers, procedures) for one API style.
#[async_trait]
pub trait Generator: Plugin {
    /// API style produced
    fn style(&self) -> ApiStyle;

    /// Generate code for `schema`.
    async fn generate(&self, schema: &SchemaIR, options: &GenerateOptions) -> Result<GeneratedCode>;
}

/// Wraps all generator output for one web framework.
#[async_trait]
pub trait Adapter: Plugin {
    /// Target framework, e.g. "express"
    fn framework(&self) -> &str;

    /// Transform the accumulated generator output. The return value replaces
    /// the accumulator.
    async fn adapt(&self, code: &GeneratedCode, options: &GenerateOptions) -> Result<GeneratedCode>;
}

/// Contributes authentication scaffolding.
#[async_trait]
pub trait Auth: Plugin {
    /// Strategy name, e.g. "jwt"
    fn strategy(&self) -> &str;

    /// Generate auth files for `schema`.
    async fn generate(&self, schema: &SchemaIR, options: &GenerateOptions) -> Result<GeneratedCode>;

    /// Middleware the generated code registers
    fn middleware(&self) -> Vec<MiddlewareDefinition>;
}

/// Emits the database access layer.
#[async_trait]
pub trait Database: Plugin {
    /// Database library, e.g. "prisma"
    fn adapter(&self) -> &str;

    /// Generate database access code for `schema`.
    async fn generate(&self, schema: &SchemaIR, options: &GenerateOptions) -> Result<GeneratedCode>;

    /// Migrations from `previous` to `schema`; `Ok(None)` when unsupported.
    async fn generate_migrations(
        &self,
        _schema: &SchemaIR,
        _previous: Option<&SchemaIR>,
    ) -> Result<Option<GeneratedCode>> {
        Ok(None)
    }
}

/// Produces deployment manifests from everything generated so far.
#[async_trait]
pub trait Deploy: Plugin {
    /// Hosting target, e.g. "docker"
    fn target(&self) -> &str;

    /// Generate manifests after inspecting the full accumulated output.
    async fn generate(&self, code: &GeneratedCode, options: &GenerateOptions) -> Result<GeneratedCode>;
}

/// Middleware registered by an auth plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiddlewareDefinition {
    /// Exported middleware name
    pub name: String,
    /// Module path the middleware is imported from
    pub import_path: String,
    /// Applied to every route rather than opt-in
    #[serde(default)]
    pub global: bool,
    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The six extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum PluginKind {
    Parser,
    Generator,
    Adapter,
    Auth,
    Database,
    Deploy,
}

impl PluginKind {
    /// Lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::Parser => "parser",
            PluginKind::Generator => "generator",
            PluginKind::Adapter => "adapter",
            PluginKind::Auth => "auth",
            PluginKind::Database => "database",
            PluginKind::Deploy => "deploy",
        }
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// A plugin of any kind, tagged explicitly at registration time.
#[derive(Clone)]
pub enum AnyPlugin {
    /// Parser plugin
    Parser(Arc<dyn Parser>),
    /// Generator plugin
    Generator(Arc<dyn Generator>),
    /// Adapter plugin
    Adapter(Arc<dyn Adapter>),
    /// Auth plugin
    Auth(Arc<dyn Auth>),
    /// Database plugin
    Database(Arc<dyn Database>),
    /// Deploy plugin
    Deploy(Arc<dyn Deploy>),
}

impl AnyPlugin {
    /// Wrap a parser
    pub fn parser(plugin: impl Parser + 'static) -> Self { AnyPlugin::Parser(Arc::new(plugin)) }

    /// Wrap a generator
    pub fn generator(plugin: impl Generator + 'static) -> Self { AnyPlugin::Generator(Arc::new(plugin)) }

    /// Wrap an adapter
    pub fn adapter(plugin: impl Adapter + 'static) -> Self { AnyPlugin::Adapter(Arc::new(plugin)) }

    /// Wrap an auth plugin
    pub fn auth(plugin: impl Auth + 'static) -> Self { AnyPlugin::Auth(Arc::new(plugin)) }

    /// Wrap a database plugin
    pub fn database(plugin: impl Database + 'static) -> Self { AnyPlugin::Database(Arc::new(plugin)) }

    /// Wrap a deploy plugin
    pub fn deploy(plugin: impl Deploy + 'static) -> Self { AnyPlugin::Deploy(Arc::new(plugin)) }

    /// Which extension point this plugin serves
    pub fn kind(&self) -> PluginKind {
        match self {
            AnyPlugin::Parser(_) => PluginKind::Parser,
            AnyPlugin::Generator(_) => PluginKind::Generator,
            AnyPlugin::Adapter(_) => PluginKind::Adapter,
            AnyPlugin::Auth(_) => PluginKind::Auth,
            AnyPlugin::Database(_) => PluginKind::Database,
            AnyPlugin::Deploy(_) => PluginKind::Deploy,
        }
    }

    /// Plugin name
    pub fn name(&self) -> &str {
        match self {
            AnyPlugin::Parser(p) => p.name(),
            AnyPlugin::Generator(p) => p.name(),
            AnyPlugin::Adapter(p) => p.name(),
            AnyPlugin::Auth(p) => p.name(),
            AnyPlugin::Database(p) => p.name(),
            AnyPlugin::Deploy(p) => p.name(),
        }
    }

    /// Plugin version
    pub fn version(&self) -> &str {
        match self {
            AnyPlugin::Parser(p) => p.version(),
            AnyPlugin::Generator(p) => p.version(),
            AnyPlugin::Adapter(p) => p.version(),
            AnyPlugin::Auth(p) => p.version(),
            AnyPlugin::Database(p) => p.version(),
            AnyPlugin::Deploy(p) => p.version(),
        }
    }

    /// The capability discriminator: file extensions for parsers, style for
    /// generators, framework / strategy / adapter / target for the rest.
    pub fn capability(&self) -> String {
        match self {
            AnyPlugin::Parser(p) => p.extensions().join(","),
            AnyPlugin::Generator(p) => p.style().to_string(),
            AnyPlugin::Adapter(p) => p.framework().to_string(),
            AnyPlugin::Auth(p) => p.strategy().to_string(),
            AnyPlugin::Database(p) => p.adapter().to_string(),
            AnyPlugin::Deploy(p) => p.target().to_string(),
        }
    }
}

impl std::fmt::Debug for AnyPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyPlugin")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("version", &self.version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::testing::StubPlugin;

    #[test]
    fn test_kind_is_explicit_tag() {
        let stub = StubPlugin::new("dual");
        assert_eq!(AnyPlugin::parser(stub.clone()).kind(), PluginKind::Parser);
        assert_eq!(AnyPlugin::generator(stub.clone()).kind(), PluginKind::Generator);
        assert_eq!(AnyPlugin::deploy(stub).kind(), PluginKind::Deploy);
    }

    #[test]
    fn test_capability_discriminator() {
        let stub = StubPlugin::new("gql").with_style(ApiStyle::Graphql).with_tag("apollo");
        assert_eq!(AnyPlugin::generator(stub.clone()).capability(), "graphql");
        assert_eq!(AnyPlugin::adapter(stub).capability(), "apollo");
    }

    #[test]
    fn test_default_can_parse_uses_extension() {
        let parser = StubPlugin::new("prisma").with_extensions(&["prisma"]);
        let input = SourceInput::from("model User {}");
        assert!(parser.can_parse(&input, Some(&PathBuf::from("schema.prisma"))));
        assert!(!parser.can_parse(&input, Some(&PathBuf::from("schema"))));
        assert!(!parser.can_parse(&input, None));
        assert!(parser.validate(&input).is_valid());
    }

    #[tokio::test]
    async fn test_stub_parse_records_path() {
        let parser = StubPlugin::new("prisma");
        let schema = parser
            .parse(&SourceInput::from(""), &ParseOptions::for_path("db/schema.prisma"))
            .await
            .expect("parse");
        assert_eq!(schema.metadata.source, "prisma");
        assert_eq!(schema.metadata.file_path.as_deref(), Some("db/schema.prisma"));
        assert_eq!(parser.calls().load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_plugin_error_messages() {
        assert_eq!(PluginError::Parse("line 3".into()).to_string(), "Parse error: line 3");
        assert_eq!(
            PluginError::Execution("boom".into()).to_string(),
            "Execution failed: boom"
        );
    }
}
