//! Error types for publication domain validation.

use thiserror::Error;

/// Errors returned while constructing publication domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublicationDomainError {
    /// The agent name is empty after trimming.
    #[error("agent name must not be empty")]
    EmptyAgentName,

    /// The agent name exceeds the storage limit.
    #[error("agent name exceeds {max} character limit (got {actual})")]
    AgentNameTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected name.
        actual: usize,
    },
}
