//! The pipeline builder and its entry points.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use config::Config;
use emitter::{EmitOptions, Emitter, WriteReport};
use ir::{GeneratedCode, GeneratedFile, SchemaIR};
use orchestrator::Orchestrator;
use plugins::{GenerateOptions, PluginRegistry, SourceInput};
use tracing::{debug, info, warn};

use crate::hooks::HookResult;
use crate::{
    CodeTransform, FileFilter, PipelineError, PipelineHook, Result, SchemaTransform, Stage,
    StageTiming,
};

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// IR after schema transforms
    pub schema: SchemaIR,
    /// Output after code transforms and filters
    pub code: GeneratedCode,
    /// Duration of every stage, in execution order
    pub timings: Vec<StageTiming>,
    /// Non-fatal findings collected during the run
    pub warnings: Vec<String>,
    /// Paths removed by file filters
    pub filtered: Vec<String>,
    /// Emitter report, when an emitter is configured
    pub write_report: Option<WriteReport>,
    /// Wall-clock duration of the whole run
    pub total_duration: Duration,
}

impl PipelineResult {
    /// Duration of one stage
    pub fn timing(&self, stage: Stage) -> Option<Duration> {
        self.timings.iter().find(|t| t.stage == stage).map(|t| t.duration)
    }
}

/// Orchestrator wrapped with stages, hooks, transforms and filters.
#[derive(Clone)]
pub struct Pipeline {
    orchestrator: Orchestrator,
    hooks: Vec<Arc<dyn PipelineHook>>,
    schema_transforms: Vec<Arc<dyn SchemaTransform>>,
    code_transforms: Vec<Arc<dyn CodeTransform>>,
    filters: Vec<FileFilter>,
    emitter: Option<Emitter>,
    warnings: Vec<String>,
}

impl Pipeline {
    /// A pipeline around `orchestrator` with nothing else attached
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            hooks: Vec::new(),
            schema_transforms: Vec::new(),
            code_transforms: Vec::new(),
            filters: Vec::new(),
            emitter: None,
            warnings: Vec::new(),
        }
    }

    /// Resolve plugins from `config` and write to `config.output`.
    ///
    /// Plugin names that do not resolve are reported in every run's warnings.
    pub fn from_config(config: &Config, registry: &PluginRegistry) -> Self {
        let (orchestrator, warnings) = Orchestrator::from_config(config, registry);
        Self { warnings, ..Self::new(orchestrator).emitter(Emitter::new(EmitOptions::new(&config.output))) }
    }

    /// Add a lifecycle hook
    pub fn hook(mut self, hook: Arc<dyn PipelineHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Add a schema transform; transforms run in the order added
    pub fn schema_transform(mut self, transform: Arc<dyn SchemaTransform>) -> Self {
        self.schema_transforms.push(transform);
        self
    }

    /// Add a code transform; transforms run in the order added
    pub fn code_transform(mut self, transform: Arc<dyn CodeTransform>) -> Self {
        self.code_transforms.push(transform);
        self
    }

    /// Add a file filter; a file is kept only if every filter accepts it
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&GeneratedFile) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Write results through `emitter` in the write stage
    pub fn emitter(mut self, emitter: Emitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// The wrapped orchestrator
    pub fn orchestrator(&self) -> &Orchestrator { &self.orchestrator }

    /// Read `path` and run every stage on it.
    pub async fn run_file(&self, path: &Path, options: &GenerateOptions) -> Result<PipelineResult> {
        let bytes = tokio::fs::read(path).await?;
        let input = match String::from_utf8(bytes) {
            Ok(text) => SourceInput::Text(text),
            Err(e) => SourceInput::Bytes(e.into_bytes()),
        };
        self.run(&input, Some(path), options).await
    }

    /// Run every stage in order. The first failing stage aborts the run
    /// after its error hooks have been notified.
    pub async fn run(
        &self,
        input: &SourceInput,
        path: Option<&Path>,
        options: &GenerateOptions,
    ) -> Result<PipelineResult> {
        let started = Instant::now();
        let mut timings = Vec::with_capacity(Stage::ALL.len());
        let mut warnings = self.warnings.clone();

        let schema = self
            .stage(Stage::Parse, &mut timings, async {
                self.orchestrator.parse(input, path).await.map_err(PipelineError::from)
            })
            .await?;

        self.stage(Stage::Validate, &mut timings, async {
            let mut result = self.orchestrator.validate();
            result.merge(self.orchestrator.validate_source(input));
            result.merge(schema.check());
            warnings.extend(result.warnings);
            if result.errors.is_empty() {
                Ok(())
            } else {
                Err(PipelineError::Validation { errors: result.errors })
            }
        })
        .await?;

        let schema = self.stage(Stage::Transform, &mut timings, self.transform_schema(schema)).await?;

        let code = self
            .stage(Stage::Generate, &mut timings, async {
                self.orchestrator.generate_from_schema(&schema, options).await.map_err(PipelineError::from)
            })
            .await?;

        let (code, filtered) = self.stage(Stage::PostProcess, &mut timings, self.post_process(code)).await?;

        let write_report = self
            .stage(Stage::Write, &mut timings, async {
                match &self.emitter {
                    Some(emitter) => emitter.write(&code).await.map(Some).map_err(PipelineError::from),
                    None => Ok(None),
                }
            })
            .await?;

        if let Some(report) = &write_report {
            warnings.extend(report.failed.iter().map(|f| format!("failed to write `{}`: {}", f.path, f.error)));
        }

        let total_duration = started.elapsed();
        info!(
            files = code.files.len(),
            warnings = warnings.len(),
            elapsed_ms = total_duration.as_millis() as u64,
            "pipeline finished"
        );

        Ok(PipelineResult { schema, code, timings, warnings, filtered, write_report, total_duration })
    }

    async fn transform_schema(&self, mut schema: SchemaIR) -> Result<SchemaIR> {
        for transform in &self.schema_transforms {
            debug!(transform = transform.name(), "applying schema transform");
            schema = transform.transform(schema).await.map_err(|e| PipelineError::Transform {
                name: transform.name().to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(schema)
    }

    async fn post_process(&self, mut code: GeneratedCode) -> Result<(GeneratedCode, Vec<String>)> {
        for transform in &self.code_transforms {
            debug!(transform = transform.name(), "applying code transform");
            code = transform.transform(code).await.map_err(|e| PipelineError::Transform {
                name: transform.name().to_string(),
                message: e.to_string(),
            })?;
        }

        let mut filtered = Vec::new();
        code.files.retain(|file| {
            let keep = self.filters.iter().all(|filter| filter(file));
            if !keep {
                filtered.push(file.path.clone());
            }
            keep
        });
        if !filtered.is_empty() {
            debug!(count = filtered.len(), "files removed by filters");
        }

        Ok((code, filtered))
    }

    /// Run `work` as `stage`, notifying hooks and recording its duration.
    async fn stage<T>(
        &self,
        stage: Stage,
        timings: &mut Vec<StageTiming>,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        for hook in &self.hooks {
            report_hook(hook.as_ref(), stage, "before", hook.before(stage).await);
        }

        let started = Instant::now();
        match work.await {
            Ok(value) => {
                let duration = started.elapsed();
                timings.push(StageTiming { stage, duration });
                info!(stage = %stage, elapsed_ms = duration.as_millis() as u64, "stage complete");
                for hook in &self.hooks {
                    report_hook(hook.as_ref(), stage, "after", hook.after(stage, duration).await);
                }
                Ok(value)
            }
            Err(error) => {
                warn!(stage = %stage, error = %error, "stage failed");
                for hook in &self.hooks {
                    report_hook(hook.as_ref(), stage, "error", hook.on_error(stage, &error).await);
                }
                Err(error)
            }
        }
    }
}

fn report_hook(hook: &dyn PipelineHook, stage: Stage, event: &str, result: HookResult) {
    if let Err(e) = result {
        warn!(hook = hook.name(), stage = %stage, event, error = %e, "hook failed; ignoring");
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("orchestrator", &self.orchestrator)
            .field("hooks", &self.hooks.len())
            .field("schema_transforms", &self.schema_transforms.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("code_transforms", &self.code_transforms.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("filters", &self.filters.len())
            .field("emitter", &self.emitter)
            .finish()
    }
}
