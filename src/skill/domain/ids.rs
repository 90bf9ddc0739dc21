//! Identifier and validated-name types for workflows.

use super::SkillDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for a workflow name, matching `VARCHAR(255)`.
const MAX_WORKFLOW_NAME_LENGTH: usize = 255;

/// Unique identifier for a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(Uuid);

impl WorkflowId {
    /// Creates a new random workflow identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a workflow identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for WorkflowId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated workflow display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowName(String);

impl WorkflowName {
    /// Creates a validated workflow name. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`SkillDomainError`] when the name is empty or too long.
    pub fn new(value: impl Into<String>) -> Result<Self, SkillDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(SkillDomainError::EmptyWorkflowName);
        }

        if normalized.chars().count() > MAX_WORKFLOW_NAME_LENGTH {
            return Err(SkillDomainError::WorkflowNameTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for WorkflowName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for WorkflowName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
