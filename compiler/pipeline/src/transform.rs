//! Schema transforms, code transforms and file filters.
//!
//! Transforms run strictly in registration order, each receiving the output
//! of the previous one. A file survives post-processing only if every filter
//! accepts it.

use std::sync::Arc;

use async_trait::async_trait;
use ir::{GeneratedCode, GeneratedFile, SchemaIR};

use crate::BoxError;

/// Rewrites the IR between parsing and generation.
#[async_trait]
pub trait SchemaTransform: Send + Sync {
    /// Name reported when the transform fails
    fn name(&self) -> &str;

    /// Produce the next IR from `schema`.
    async fn transform(&self, schema: SchemaIR) -> Result<SchemaIR, BoxError>;
}

/// Rewrites the merged output after generation.
#[async_trait]
pub trait CodeTransform: Send + Sync {
    /// Name reported when the transform fails
    fn name(&self) -> &str;

    /// Produce the next output from `code`.
    async fn transform(&self, code: GeneratedCode) -> Result<GeneratedCode, BoxError>;
}

/// Predicate deciding whether a generated file is kept.
pub type FileFilter = Arc<dyn Fn(&GeneratedFile) -> bool + Send + Sync>;

/// Synchronous closure wrapped as a transform.
struct FnTransform<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F> SchemaTransform for FnTransform<F>
where
    F: Fn(SchemaIR) -> Result<SchemaIR, BoxError> + Send + Sync,
{
    fn name(&self) -> &str { &self.name }

    async fn transform(&self, schema: SchemaIR) -> Result<SchemaIR, BoxError> { (self.f)(schema) }
}

#[async_trait]
impl<F> CodeTransform for FnTransform<F>
where
    F: Fn(GeneratedCode) -> Result<GeneratedCode, BoxError> + Send + Sync,
{
    fn name(&self) -> &str { &self.name }

    async fn transform(&self, code: GeneratedCode) -> Result<GeneratedCode, BoxError> { (self.f)(code) }
}

/// Wrap a closure as a [`SchemaTransform`].
pub fn schema_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn SchemaTransform>
where
    F: Fn(SchemaIR) -> Result<SchemaIR, BoxError> + Send + Sync + 'static,
{
    Arc::new(FnTransform { name: name.into(), f })
}

/// Wrap a closure as a [`CodeTransform`].
pub fn code_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn CodeTransform>
where
    F: Fn(GeneratedCode) -> Result<GeneratedCode, BoxError> + Send + Sync + 'static,
{
    Arc::new(FnTransform { name: name.into(), f })
}
