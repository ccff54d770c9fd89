//! Lifecycle hooks.
//!
//! Hooks observe stages; they never influence them. A hook that fails is
//! logged at `warn` and otherwise ignored.

use std::time::Duration;

use async_trait::async_trait;

use crate::{BoxError, PipelineError, Stage};

/// Result of a hook call.
pub type HookResult = std::result::Result<(), BoxError>;

/// Observer notified around every stage.
#[async_trait]
pub trait PipelineHook: Send + Sync {
    /// Name used when logging hook failures
    fn name(&self) -> &str { "hook" }

    /// Called before `stage` starts.
    async fn before(&self, _stage: Stage) -> HookResult { Ok(()) }

    /// Called after `stage` completed successfully.
    async fn after(&self, _stage: Stage, _elapsed: Duration) -> HookResult { Ok(()) }

    /// Called when `stage` failed, before the error reaches the caller.
    async fn on_error(&self, _stage: Stage, _error: &PipelineError) -> HookResult { Ok(()) }
}
