#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Apigen Orchestrator
//!
//! Holds the plugins selected for a run and executes them in a fixed order:
//!
//! 1. parse the source into a [`SchemaIR`]
//! 2. run every generator, merging each result
//! 3. pass the accumulated output through the adapter, which replaces it
//!    (paths it repeats are settled by the merge strategy)
//! 4. run every auth plugin, merging each result
//! 5. run the database plugin (and its migrations, when a previous schema is known)
//! 6. run every deploy plugin against the full output so far, merging each result
//! 7. merge the dependencies every active plugin declares
//!
//! Within steps 2, 4 and 6 plugins run in ascending priority order (stable),
//! so under last-wins merging the highest-priority plugin has the final say.
//! Any plugin failure aborts the run.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use ir::{CodeMetadata, Dependency, GeneratedCode, SchemaIR, ValidationResult};
use merge::{merge_code, merge_dependencies, MergeError, MergeStrategy};
use plugins::{
    Adapter, AnyPlugin, Auth, Database, Deploy, GenerateOptions, Generator, MiddlewareDefinition,
    ParseOptions, Parser, Plugin, PluginError, SourceInput,
};
use thiserror::Error;
use tracing::{debug, info};

mod resolve;
pub mod watch;

pub use watch::{WatchEvent, WatchOptions, Watcher};

/// Errors that can occur while running the orchestrator
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// `parse`/`generate` was called without a parser
    #[error("no parser registered")]
    MissingParser,
    /// The parser rejected the source
    #[error("parser `{parser}` failed: {source}")]
    Parse {
        /// Name of the parser
        parser: String,
        /// The parser's own error
        #[source]
        source: PluginError,
    },
    /// A generator, adapter, auth, database or deploy plugin failed
    #[error(transparent)]
    Plugin(#[from] PluginError),
    /// Two outputs collided under the `error` merge strategy
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// Reading the schema file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Writing the output failed
    #[error(transparent)]
    Emit(#[from] emitter::EmitError),
    /// The file watcher could not be set up
    #[error("watch error: {0}")]
    Watch(String),
    /// Plugin-provided metadata could not be encoded
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenient result type for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Plugins selected for a run.
///
/// Builder methods consume and return the value, so a configured
/// orchestrator can be cloned and extended without affecting the original.
/// One instance runs one generation at a time.
#[derive(Clone, Default)]
pub struct Orchestrator {
    parser: Option<Arc<dyn Parser>>,
    generators: Vec<Arc<dyn Generator>>,
    adapter: Option<Arc<dyn Adapter>>,
    auth: Vec<Arc<dyn Auth>>,
    database: Option<Arc<dyn Database>>,
    deploy: Vec<Arc<dyn Deploy>>,
    strategy: MergeStrategy,
    previous_schema: Option<SchemaIR>,
    strict: bool,
}

impl Orchestrator {
    /// An orchestrator with no plugins and last-wins merging
    pub fn new() -> Self { Self::default() }

    /// Set the parser, replacing any previous one
    pub fn parser(mut self, parser: Arc<dyn Parser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Add a generator
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generators.push(generator);
        self
    }

    /// Set the adapter, replacing any previous one
    pub fn adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Add an auth plugin
    pub fn auth(mut self, auth: Arc<dyn Auth>) -> Self {
        self.auth.push(auth);
        self
    }

    /// Set the database plugin, replacing any previous one
    pub fn database(mut self, database: Arc<dyn Database>) -> Self {
        self.database = Some(database);
        self
    }

    /// Add a deploy plugin
    pub fn deploy(mut self, deploy: Arc<dyn Deploy>) -> Self {
        self.deploy.push(deploy);
        self
    }

    /// Add any plugin according to its kind
    pub fn plugin(self, plugin: AnyPlugin) -> Self {
        match plugin {
            AnyPlugin::Parser(p) => self.parser(p),
            AnyPlugin::Generator(g) => self.generator(g),
            AnyPlugin::Adapter(a) => self.adapter(a),
            AnyPlugin::Auth(a) => self.auth(a),
            AnyPlugin::Database(d) => self.database(d),
            AnyPlugin::Deploy(d) => self.deploy(d),
        }
    }

    /// How colliding file paths are settled
    pub fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Schema of the previous run; enables database migrations
    pub fn previous_schema(mut self, schema: SchemaIR) -> Self {
        self.previous_schema = Some(schema);
        self
    }

    /// Treat parser warnings as errors
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The merge strategy in use
    pub fn strategy(&self) -> MergeStrategy { self.strategy }

    /// Middleware registered by the auth plugins, in execution order.
    /// A name already registered by an earlier plugin is skipped.
    pub fn middleware(&self) -> Vec<MiddlewareDefinition> {
        let mut middleware: Vec<MiddlewareDefinition> = Vec::new();
        for auth in by_priority(&self.auth) {
            for definition in auth.middleware() {
                if !middleware.iter().any(|m| m.name == definition.name) {
                    middleware.push(definition);
                }
            }
        }
        middleware
    }

    /// Dry configuration check. Missing parser or generators are errors;
    /// missing adapter, auth or database are warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if self.parser.is_none() {
            result.push_error("no parser registered");
        }
        if self.generators.is_empty() {
            result.push_error("no generator registered");
        }
        if self.adapter.is_none() {
            result.push_warning("no adapter registered; output is not wired to a web framework");
        }
        if self.auth.is_empty() {
            result.push_warning("no auth plugin registered; generated endpoints are unauthenticated");
        }
        if self.database.is_none() {
            result.push_warning("no database plugin registered; no data access layer is generated");
        }

        result
    }

    /// Non-failing check of the source by the parser, if there is one.
    /// In strict mode its warnings are reported as errors.
    pub fn validate_source(&self, input: &SourceInput) -> ValidationResult {
        let mut result = match &self.parser {
            Some(parser) => parser.validate(input),
            None => ValidationResult::ok(),
        };
        if self.strict {
            for warning in std::mem::take(&mut result.warnings) {
                result.push_error(warning);
            }
        }
        result
    }

    /// Step 1: parse `input` into an IR
    pub async fn parse(&self, input: &SourceInput, path: Option<&Path>) -> Result<SchemaIR> {
        let parser = self.parser.as_ref().ok_or(OrchestratorError::MissingParser)?;
        let options = ParseOptions { file_path: path.map(Path::to_path_buf), strict: self.strict };

        debug!(parser = parser.name(), bytes = input.len(), "parsing source");
        parser
            .parse(input, &options)
            .await
            .map_err(|source| OrchestratorError::Parse { parser: parser.name().to_string(), source })
    }

    /// Steps 1 to 7
    pub async fn generate(
        &self,
        input: &SourceInput,
        path: Option<&Path>,
        options: &GenerateOptions,
    ) -> Result<GeneratedCode> {
        let schema = self.parse(input, path).await?;
        self.generate_from_schema(&schema, options).await
    }

    /// Steps 2 to 7 against an already parsed schema
    pub async fn generate_from_schema(
        &self,
        schema: &SchemaIR,
        options: &GenerateOptions,
    ) -> Result<GeneratedCode> {
        let mut code = GeneratedCode::default();
        let mut contributors = Vec::new();

        for generator in by_priority(&self.generators) {
            debug!(plugin = generator.name(), style = %generator.style(), "running generator");
            let output = generator.generate(schema, options).await?;
            code = merge_code(code, output, self.strategy)?;
            contributors.push(generator.name().to_string());
        }

        if let Some(adapter) = &self.adapter {
            debug!(plugin = adapter.name(), files = code.files.len(), "running adapter");
            let adapted = adapter.adapt(&code, options).await?;
            code = merge_code(GeneratedCode::default(), adapted, self.strategy)?;
            contributors.push(adapter.name().to_string());
        }

        for auth in by_priority(&self.auth) {
            debug!(plugin = auth.name(), strategy = auth.strategy(), "running auth plugin");
            let output = auth.generate(schema, options).await?;
            code = merge_code(code, output, self.strategy)?;
            contributors.push(auth.name().to_string());
        }

        if let Some(database) = &self.database {
            debug!(plugin = database.name(), "running database plugin");
            let output = database.generate(schema, options).await?;
            code = merge_code(code, output, self.strategy)?;

            if let Some(previous) = &self.previous_schema {
                if let Some(migrations) = database.generate_migrations(schema, Some(previous)).await? {
                    debug!(plugin = database.name(), files = migrations.files.len(), "merging migrations");
                    code = merge_code(code, migrations, self.strategy)?;
                }
            }
            contributors.push(database.name().to_string());
        }

        for deploy in by_priority(&self.deploy) {
            debug!(plugin = deploy.name(), target = deploy.target(), "running deploy plugin");
            let output = deploy.generate(&code, options).await?;
            code = merge_code(code, output, self.strategy)?;
            contributors.push(deploy.name().to_string());
        }

        code.dependencies = merge_dependencies(code.dependencies, self.declared_dependencies());
        let mut metadata = CodeMetadata {
            generated_at: Some(Utc::now()),
            contributors,
            ..code.metadata.unwrap_or_default()
        };
        let middleware = self.middleware();
        if !middleware.is_empty() {
            metadata.extra.insert("middleware".to_string(), serde_json::to_value(middleware)?);
        }
        code.metadata = Some(metadata);

        info!(
            files = code.files.len(),
            dependencies = code.dependencies.len(),
            "generation finished"
        );
        Ok(code)
    }

    /// Dependencies and peer dependencies of every active plugin, merged in
    /// the order adapter, generators, auth, database, deploy.
    fn declared_dependencies(&self) -> Vec<Dependency> {
        let mut lists = Vec::new();
        if let Some(adapter) = &self.adapter {
            lists.extend(declared(adapter.as_ref()));
        }
        for generator in &self.generators {
            lists.extend(declared(generator.as_ref()));
        }
        for auth in &self.auth {
            lists.extend(declared(auth.as_ref()));
        }
        if let Some(database) = &self.database {
            lists.extend(declared(database.as_ref()));
        }
        for deploy in &self.deploy {
            lists.extend(declared(deploy.as_ref()));
        }

        lists.into_iter().fold(Vec::new(), merge_dependencies)
    }
}

fn declared<T: Plugin + ?Sized>(plugin: &T) -> [Vec<Dependency>; 2] {
    [plugin.dependencies(), plugin.peer_dependencies()]
}

/// Stable ascending sort on priority.
fn by_priority<T: Plugin + ?Sized>(plugins: &[Arc<T>]) -> Vec<Arc<T>> {
    let mut ordered = plugins.to_vec();
    ordered.sort_by_key(|plugin| plugin.priority());
    ordered
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("parser", &self.parser.as_ref().map(|p| p.name().to_string()))
            .field("generators", &self.generators.iter().map(|g| g.name()).collect::<Vec<_>>())
            .field("adapter", &self.adapter.as_ref().map(|a| a.name().to_string()))
            .field("auth", &self.auth.iter().map(|a| a.name()).collect::<Vec<_>>())
            .field("database", &self.database.as_ref().map(|d| d.name().to_string()))
            .field("deploy", &self.deploy.iter().map(|d| d.name()).collect::<Vec<_>>())
            .field("strategy", &self.strategy)
            .field("strict", &self.strict)
            .finish()
    }
}
