#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Apigen Configuration
//!
//! This crate provides project configuration for Apigen.
//! It handles loading, validating, discovering and saving `apigen.toml`, which specifies:
//! - The source schema and the output directory
//! - Which API styles to generate and which adapter/auth/database/deploy plugins to use
//! - Feature switches and plugin-specific options
//! - Logging and merge settings
//!
//! Configuration is stored in TOML format. Unknown keys are rejected, and semantic
//! checks run on every load.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use merge::MergeStrategy;
use plugins::{ApiStyle, FeatureFlags, GenerateOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name looked up by [`Config::discover`]
pub const CONFIG_FILE_NAME: &str = "apigen.toml";

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Failed to parse the TOML configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize configuration to TOML format
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// No configuration file was found walking up from the given directory
    #[error("Config file not found from: {0}")]
    NotFound(PathBuf),
    /// The configuration parsed but is not usable
    #[error("Invalid config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the source schema
    pub schema: PathBuf,
    /// Where generated files are written
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Framework adapter (e.g. "express")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<String>,
    /// Auth strategies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth: Vec<String>,
    /// Database library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Deployment targets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deploy: Vec<String>,
    /// API styles to generate
    #[serde(default)]
    pub api: ApiConfig,
    /// Feature switches
    #[serde(default)]
    pub features: FeaturesConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Output merge settings
    #[serde(default)]
    pub merge: MergeConfig,
    /// Treat parser warnings as errors
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strict: bool,
    /// Free-form plugin options, forwarded as `GenerateOptions::extra`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, toml::Value>,
}

fn default_output() -> PathBuf { PathBuf::from("generated") }

/// Which API styles are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// REST endpoints
    pub rest: bool,
    /// GraphQL schema and resolvers
    pub graphql: bool,
    /// tRPC router
    pub trpc: bool,
}

impl Default for ApiConfig {
    fn default() -> Self { Self { rest: true, graphql: false, trpc: false } }
}

impl ApiConfig {
    /// Enabled styles in fixed order
    pub fn styles(&self) -> Vec<ApiStyle> {
        ApiStyle::ALL
            .into_iter()
            .filter(|style| match style {
                ApiStyle::Rest => self.rest,
                ApiStyle::Graphql => self.graphql,
                ApiStyle::Trpc => self.trpc,
            })
            .collect()
    }
}

/// `[features]` table, spelled the TOML way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(missing_docs)]
pub struct FeaturesConfig {
    pub validation: bool,
    pub pagination: bool,
    pub soft_delete: bool,
    pub timestamps: bool,
    pub openapi: bool,
    pub tests: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        let flags = FeatureFlags::default();
        Self {
            validation: flags.validation,
            pagination: flags.pagination,
            soft_delete: flags.soft_delete,
            timestamps: flags.timestamps,
            openapi: flags.openapi,
            tests: flags.tests,
        }
    }
}

impl From<FeaturesConfig> for FeatureFlags {
    fn from(f: FeaturesConfig) -> Self {
        FeatureFlags {
            validation: f.validation,
            pagination: f.pagination,
            soft_delete: f.soft_delete,
            timestamps: f.timestamps,
            openapi: f.openapi,
            tests: f.tests,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error, or a full
    /// `target=level` list). `RUST_LOG` overrides it.
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "info".to_string(), format: LogFormat::Pretty } }
}

/// `[merge]` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// How colliding file paths are settled
    pub strategy: MergeStrategy,
}

impl Config {
    /// A minimal config for `schema` with every other key defaulted
    pub fn new(schema: impl Into<PathBuf>) -> Self {
        Self {
            schema: schema.into(),
            output: default_output(),
            adapter: None,
            auth: Vec::new(),
            database: None,
            deploy: Vec::new(),
            api: ApiConfig::default(),
            features: FeaturesConfig::default(),
            logging: LoggingConfig::default(),
            merge: MergeConfig::default(),
            strict: false,
            plugins: BTreeMap::new(),
        }
    }

    /// Load and validate configuration from a TOML file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save this configuration as a pretty-printed TOML file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Find `apigen.toml` in `start_dir` or its closest ancestor and load it.
    ///
    /// Relative `schema` and `output` paths are resolved against the
    /// directory holding the file. Returns the config and the file's path.
    pub fn discover<P: AsRef<Path>>(start_dir: P) -> Result<(Self, PathBuf), ConfigError> {
        let start_dir = start_dir.as_ref();
        let path = Self::locate(start_dir).ok_or_else(|| ConfigError::NotFound(start_dir.to_path_buf()))?;
        let config = Self::from_file(&path)?;
        let base = path.parent().unwrap_or(Path::new("."));
        Ok((config.relative_to(base), path))
    }

    /// Path of the closest `apigen.toml` at or above `start_dir`
    pub fn locate(start_dir: &Path) -> Option<PathBuf> {
        start_dir.ancestors().map(|dir| dir.join(CONFIG_FILE_NAME)).find(|candidate| candidate.is_file())
    }

    /// Copy with relative `schema` and `output` joined onto `base`
    pub fn relative_to(&self, base: &Path) -> Self {
        let rebase = |p: &Path| if p.is_relative() { base.join(p) } else { p.to_path_buf() };
        Self { schema: rebase(&self.schema), output: rebase(&self.output), ..self.clone() }
    }

    /// Semantic checks that the schema cannot express. Every problem is
    /// reported, not just the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.schema.as_os_str().is_empty() {
            errors.push("`schema` must not be empty".to_string());
        }
        if self.output.as_os_str().is_empty() {
            errors.push("`output` must not be empty".to_string());
        }
        if self.api.styles().is_empty() {
            errors.push("at least one of `api.rest`, `api.graphql` or `api.trpc` must be enabled".to_string());
        }
        for (key, values) in [("auth", &self.auth), ("deploy", &self.deploy)] {
            let mut seen = HashSet::new();
            for value in values {
                if value.trim().is_empty() {
                    errors.push(format!("`{}` contains an empty entry", key));
                } else if !seen.insert(value.as_str()) {
                    errors.push(format!("`{}` lists `{}` more than once", key, value));
                }
            }
        }
        for (key, value) in [("adapter", &self.adapter), ("database", &self.database)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                errors.push(format!("`{}` must not be empty when set", key));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Build the options value every plugin of a run receives
    pub fn generate_options(&self) -> GenerateOptions {
        let mut options = GenerateOptions::new(&self.output, self.schema.display().to_string());
        options.features = self.features.into();
        options.extra = self
            .plugins
            .iter()
            .filter_map(|(key, value)| serde_json::to_value(value).ok().map(|v| (key.clone(), v)))
            .collect();
        options
    }
}

impl Default for Config {
    fn default() -> Self { Self::new("schema.prisma") }
}
