//! Options handed to plugins.
//!
//! A single [`GenerateOptions`] value travels unchanged through every plugin
//! of a run. Each nested section has documented defaults so a plugin never
//! has to guess.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PluginError;

/// Raw source handed to a parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    /// UTF-8 text
    Text(String),
    /// Binary buffer (e.g. a protobuf descriptor set)
    Bytes(Vec<u8>),
}

impl SourceInput {
    /// The input as text; binary input must be valid UTF-8.
    pub fn as_text(&self) -> Result<Cow<'_, str>, PluginError> {
        match self {
            SourceInput::Text(text) => Ok(Cow::Borrowed(text)),
            SourceInput::Bytes(bytes) => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|e| PluginError::Parse(format!("input is not valid UTF-8: {}", e))),
        }
    }

    /// The input as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            SourceInput::Text(text) => text.as_bytes(),
            SourceInput::Bytes(bytes) => bytes,
        }
    }

    /// Size of the input in bytes.
    pub fn len(&self) -> usize { self.as_bytes().len() }

    /// Whether the input is empty.
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl From<String> for SourceInput {
    fn from(text: String) -> Self { SourceInput::Text(text) }
}

impl From<&str> for SourceInput {
    fn from(text: &str) -> Self { SourceInput::Text(text.to_string()) }
}

impl From<Vec<u8>> for SourceInput {
    fn from(bytes: Vec<u8>) -> Self { SourceInput::Bytes(bytes) }
}

/// Options for a parse call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// File the input was read from
    pub file_path: Option<PathBuf>,
    /// Treat parser warnings as errors
    pub strict: bool,
}

impl ParseOptions {
    /// Options for input read from `path`.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        Self { file_path: Some(path.as_ref().to_path_buf()), strict: false }
    }
}

/// API styles a generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    /// REST endpoints
    Rest,
    /// GraphQL schema and resolvers
    Graphql,
    /// tRPC procedures
    Trpc,
}

impl ApiStyle {
    /// Every style in a fixed order
    pub const ALL: [ApiStyle; 3] = [ApiStyle::Rest, ApiStyle::Graphql, ApiStyle::Trpc];

    /// Lowercase name of the style
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiStyle::Rest => "rest",
            ApiStyle::Graphql => "graphql",
            ApiStyle::Trpc => "trpc",
        }
    }
}

impl std::fmt::Display for ApiStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Options passed to every plugin of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptions {
    /// Output directory
    pub output: PathBuf,
    /// Source schema locator
    pub schema: String,
    /// REST generator options
    pub rest: RestOptions,
    /// GraphQL generator options
    pub graphql: GraphqlOptions,
    /// tRPC generator options
    pub trpc: TrpcOptions,
    /// Cross-cutting feature switches
    pub features: FeatureFlags,
    /// Plugin-specific keys
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from("generated"),
            schema: String::new(),
            rest: RestOptions::default(),
            graphql: GraphqlOptions::default(),
            trpc: TrpcOptions::default(),
            features: FeatureFlags::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl GenerateOptions {
    /// Options with the two mandatory keys set and every section defaulted.
    pub fn new(output: impl Into<PathBuf>, schema: impl Into<String>) -> Self {
        Self { output: output.into(), schema: schema.into(), ..Self::default() }
    }

    /// Copy with a different output directory.
    pub fn with_output(&self, output: impl Into<PathBuf>) -> Self {
        Self { output: output.into(), ..self.clone() }
    }

    /// Plugin-specific value from `extra`.
    pub fn extra(&self, key: &str) -> Option<&Value> { self.extra.get(key) }
}

/// REST generator options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestOptions {
    /// Route prefix
    pub prefix: String,
    /// List endpoint pagination
    pub pagination: PaginationOptions,
    /// Put the API version into the route path
    pub versioning: bool,
}

impl Default for RestOptions {
    fn default() -> Self {
        Self { prefix: "/api/v1".to_string(), pagination: PaginationOptions::default(), versioning: false }
    }
}

/// Pagination style for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationStrategy {
    /// `?offset=&limit=`
    #[default]
    Offset,
    /// `?cursor=&limit=`
    Cursor,
}

/// Pagination options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationOptions {
    /// Pagination style
    pub strategy: PaginationStrategy,
    /// Page size when the client sends none
    pub default_limit: u32,
    /// Upper bound on the client-requested page size
    pub max_limit: u32,
}

impl Default for PaginationOptions {
    fn default() -> Self { Self { strategy: PaginationStrategy::Offset, default_limit: 20, max_limit: 100 } }
}

/// GraphQL generator options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphqlOptions {
    /// Endpoint path
    pub path: String,
    /// Serve the interactive playground
    pub playground: bool,
    /// Generate subscription resolvers
    pub subscriptions: bool,
}

impl Default for GraphqlOptions {
    fn default() -> Self { Self { path: "/graphql".to_string(), playground: true, subscriptions: false } }
}

/// tRPC generator options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrpcOptions {
    /// Exported root router name
    pub router_name: String,
    /// Data transformer package
    pub transformer: Option<String>,
}

impl Default for TrpcOptions {
    fn default() -> Self { Self { router_name: "appRouter".to_string(), transformer: Some("superjson".to_string()) } }
}

/// Cross-cutting feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct FeatureFlags {
    pub validation: bool,
    pub pagination: bool,
    pub soft_delete: bool,
    pub timestamps: bool,
    pub openapi: bool,
    pub tests: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            validation: true,
            pagination: true,
            soft_delete: false,
            timestamps: true,
            openapi: true,
            tests: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = GenerateOptions::new("out", "schema.prisma");
        assert_eq!(options.rest.prefix, "/api/v1");
        assert_eq!(options.rest.pagination.strategy, PaginationStrategy::Offset);
        assert_eq!(options.rest.pagination.default_limit, 20);
        assert_eq!(options.rest.pagination.max_limit, 100);
        assert_eq!(options.graphql.path, "/graphql");
        assert_eq!(options.trpc.router_name, "appRouter");
        assert!(options.features.validation);
    }

    #[test]
    fn test_with_output_keeps_everything_else() {
        let mut options = GenerateOptions::new("out", "schema.prisma");
        options.rest.prefix = "/v2".to_string();
        let moved = options.with_output("elsewhere");
        assert_eq!(moved.output, PathBuf::from("elsewhere"));
        assert_eq!(moved.schema, "schema.prisma");
        assert_eq!(moved.rest.prefix, "/v2");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let options: GenerateOptions =
            serde_json::from_str(r#"{ "output": "x", "rest": { "pagination": { "maxLimit": 50 } } }"#)
                .expect("options");
        assert_eq!(options.rest.pagination.max_limit, 50);
        assert_eq!(options.rest.pagination.default_limit, 20);
        assert_eq!(options.rest.prefix, "/api/v1");
    }

    #[test]
    fn test_source_input_text() {
        let bytes = SourceInput::from(b"model User {}".to_vec());
        assert_eq!(bytes.as_text().expect("utf8"), "model User {}");
        assert!(SourceInput::Bytes(vec![0xff, 0xfe]).as_text().is_err());
        assert!(SourceInput::from("").is_empty());
    }
}
