//! Error types for skill domain validation.

use thiserror::Error;

/// Errors returned while constructing skill domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SkillDomainError {
    /// The workflow name is empty after trimming.
    #[error("workflow name must not be empty")]
    EmptyWorkflowName,

    /// The workflow name exceeds the storage limit.
    #[error("workflow name exceeds 255 character limit: {0}")]
    WorkflowNameTooLong(String),
}
