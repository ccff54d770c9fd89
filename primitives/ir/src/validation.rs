//! Non-throwing validation reports shared by parsers, the IR checker and the
//! orchestrator's configuration check.

use serde::{Deserialize, Serialize};

/// Errors and warnings collected by a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `false` as soon as one error has been recorded
    pub valid: bool,
    /// Problems that prevent generation
    pub errors: Vec<String>,
    /// Problems that only degrade the output
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self { Self::ok() }
}

impl ValidationResult {
    /// A passing result with no messages.
    pub fn ok() -> Self { Self { valid: true, errors: Vec::new(), warnings: Vec::new() } }

    /// Whether no error has been recorded.
    pub fn is_valid(&self) -> bool { self.errors.is_empty() }

    /// Record an error.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }

    /// Record a warning.
    pub fn push_warning(&mut self, message: impl Into<String>) { self.warnings.push(message.into()); }

    /// Append another report's messages.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.valid = self.errors.is_empty();
    }
}
