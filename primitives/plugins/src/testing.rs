//! Stub plugins for tests.
//!
//! [`StubPlugin`] implements every plugin contract so one configurable value
//! can stand in for any kind. It records the file paths it was handed, which
//! lets tests assert what an adapter or deploy plugin actually saw.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ir::{Dependency, GeneratedCode, GeneratedFile, SchemaIR, SchemaMetadata, ValidationResult};

use crate::{
    Adapter, ApiStyle, Auth, Database, Deploy, GenerateOptions, Generator,
    MiddlewareDefinition, ParseOptions, Parser, Plugin, PluginError, Result, SourceInput,
};

/// Configurable plugin implementing all six contracts.
#[derive(Debug, Clone)]
pub struct StubPlugin {
    name: String,
    version: String,
    priority: i32,
    style: ApiStyle,
    tag: String,
    extensions: Vec<&'static str>,
    schema: Option<SchemaIR>,
    source_warnings: Vec<String>,
    files: Vec<GeneratedFile>,
    dependencies: Vec<Dependency>,
    peer_dependencies: Vec<Dependency>,
    migrations: Option<GeneratedCode>,
    middleware: Vec<MiddlewareDefinition>,
    replace: bool,
    failure: Option<PluginError>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Vec<String>>>>,
}

impl StubPlugin {
    /// A stub named `name` that produces nothing.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: "0.0.0-test".to_string(),
            priority: 0,
            style: ApiStyle::Rest,
            tag: name.to_string(),
            extensions: vec!["json"],
            schema: None,
            source_warnings: Vec::new(),
            files: Vec::new(),
            dependencies: Vec::new(),
            peer_dependencies: Vec::new(),
            migrations: None,
            middleware: Vec::new(),
            replace: false,
            failure: None,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the generator style.
    pub fn with_style(mut self, style: ApiStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the framework / strategy / adapter / target discriminator.
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    /// Set the parser's file extensions.
    pub fn with_extensions(mut self, extensions: &[&'static str]) -> Self {
        self.extensions = extensions.to_vec();
        self
    }

    /// IR returned by `parse`.
    pub fn with_schema(mut self, schema: SchemaIR) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Add a file to every output.
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.push(GeneratedFile::new(path, content));
        self
    }

    /// As a parser, report `warning` from `validate`. A strict parse fails
    /// with it instead.
    pub fn with_source_warning(mut self, warning: &str) -> Self {
        self.source_warnings.push(warning.to_string());
        self
    }

    /// Add a declared dependency.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Add a declared peer dependency.
    pub fn with_peer_dependency(mut self, dependency: Dependency) -> Self {
        self.peer_dependencies.push(dependency);
        self
    }

    /// Output returned by `generate_migrations`.
    pub fn with_migrations(mut self, migrations: GeneratedCode) -> Self {
        self.migrations = Some(migrations);
        self
    }

    /// Add an auth middleware definition.
    pub fn with_middleware(mut self, name: &str) -> Self {
        self.middleware.push(MiddlewareDefinition {
            name: name.to_string(),
            import_path: format!("./middleware/{}", name),
            global: false,
            description: None,
        });
        self
    }

    /// As an adapter, return only the stub's own files instead of wrapping
    /// the input.
    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Fail every call with `error`.
    pub fn failing(mut self, error: PluginError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Sleep this long inside every async call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared call counter, readable after the stub was moved into a registry.
    pub fn calls(&self) -> Arc<AtomicUsize> { Arc::clone(&self.calls) }

    /// Shared log of the file paths each call received.
    pub fn seen(&self) -> Arc<Mutex<Vec<Vec<String>>>> { Arc::clone(&self.seen) }

    async fn enter(&self, input: Option<&GeneratedCode>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = input {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(code.files.iter().map(|f| f.path.clone()).collect());
            }
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn output(&self) -> GeneratedCode {
        GeneratedCode { files: self.files.clone(), dependencies: Vec::new(), metadata: None }
    }
}

impl Plugin for StubPlugin {
    fn name(&self) -> &str { &self.name }

    fn version(&self) -> &str { &self.version }

    fn priority(&self) -> i32 { self.priority }

    fn dependencies(&self) -> Vec<Dependency> { self.dependencies.clone() }

    fn peer_dependencies(&self) -> Vec<Dependency> { self.peer_dependencies.clone() }
}

#[async_trait]
impl Parser for StubPlugin {
    fn extensions(&self) -> &[&str] { &self.extensions }

    fn validate(&self, _input: &SourceInput) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for warning in &self.source_warnings {
            result.push_warning(warning.clone());
        }
        result
    }

    async fn parse(&self, _input: &SourceInput, options: &ParseOptions) -> Result<SchemaIR> {
        self.enter(None).await?;
        if options.strict && !self.source_warnings.is_empty() {
            return Err(PluginError::Parse(self.source_warnings.join("; ")));
        }
        let mut schema = self.schema.clone().unwrap_or_else(|| {
            SchemaIR::new(
                SchemaMetadata {
                    name: "stub".to_string(),
                    source: self.name.clone(),
                    ..Default::default()
                },
                Vec::new(),
                Vec::new(),
            )
        });
        if let Some(path) = &options.file_path {
            schema.metadata.file_path = Some(path.display().to_string());
        }
        Ok(schema)
    }
}

#[async_trait]
impl Generator for StubPlugin {
    fn style(&self) -> ApiStyle { self.style }

    async fn generate(&self, _schema: &SchemaIR, _options: &GenerateOptions) -> Result<GeneratedCode> {
        self.enter(None).await?;
        Ok(self.output())
    }
}

#[async_trait]
impl Adapter for StubPlugin {
    fn framework(&self) -> &str { &self.tag }

    async fn adapt(&self, code: &GeneratedCode, _options: &GenerateOptions) -> Result<GeneratedCode> {
        self.enter(Some(code)).await?;
        if self.replace {
            return Ok(self.output());
        }
        let mut adapted = code.clone();
        adapted.files.extend(self.files.iter().cloned());
        Ok(adapted)
    }
}

#[async_trait]
impl Auth for StubPlugin {
    fn strategy(&self) -> &str { &self.tag }

    async fn generate(&self, _schema: &SchemaIR, _options: &GenerateOptions) -> Result<GeneratedCode> {
        self.enter(None).await?;
        Ok(self.output())
    }

    fn middleware(&self) -> Vec<MiddlewareDefinition> { self.middleware.clone() }
}

#[async_trait]
impl Database for StubPlugin {
    fn adapter(&self) -> &str { &self.tag }

    async fn generate(&self, _schema: &SchemaIR, _options: &GenerateOptions) -> Result<GeneratedCode> {
        self.enter(None).await?;
        Ok(self.output())
    }

    async fn generate_migrations(
        &self,
        _schema: &SchemaIR,
        previous: Option<&SchemaIR>,
    ) -> Result<Option<GeneratedCode>> {
        Ok(previous.and(self.migrations.clone()))
    }
}

#[async_trait]
impl Deploy for StubPlugin {
    fn target(&self) -> &str { &self.tag }

    async fn generate(&self, code: &GeneratedCode, _options: &GenerateOptions) -> Result<GeneratedCode> {
        self.enter(Some(code)).await?;
        Ok(self.output())
    }
}
