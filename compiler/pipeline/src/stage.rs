//! Pipeline stages.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// A named phase of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    /// Source to IR
    Parse,
    /// Configuration and schema checks
    Validate,
    /// Schema transforms
    Transform,
    /// Orchestrator steps 2 to 7
    Generate,
    /// Code transforms and file filters
    PostProcess,
    /// Emission to disk
    Write,
}

impl Stage {
    /// Every stage in execution order
    pub const ALL: [Stage; 6] =
        [Stage::Parse, Stage::Validate, Stage::Transform, Stage::Generate, Stage::PostProcess, Stage::Write];

    /// Name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Validate => "validate",
            Stage::Transform => "transform",
            Stage::Generate => "generate",
            Stage::PostProcess => "postProcess",
            Stage::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Wall-clock duration of one completed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    /// The stage
    pub stage: Stage,
    /// How long it took
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_declaration() {
        let mut sorted = Stage::ALL;
        sorted.sort();
        assert_eq!(sorted, Stage::ALL);
        assert_eq!(Stage::PostProcess.to_string(), "postProcess");
    }
}
