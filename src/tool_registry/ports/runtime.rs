//! Port for pushing queued changes into the flow runtime.

use crate::tool_registry::domain::{McpServer, PendingChange};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for runtime operations.
pub type McpRuntimeResult<T> = Result<T, McpRuntimeError>;

/// Live MCP configuration consumed by the flow runtime.
#[async_trait]
pub trait McpRuntime: Send + Sync {
    /// Applies one change.
    ///
    /// `current` is the server as stored now, or `None` once it has been
    /// deleted. Applying the same change twice must leave the runtime in the
    /// same state as applying it once.
    ///
    /// # Errors
    ///
    /// Returns [`McpRuntimeError`] when the runtime rejects or cannot receive
    /// the change.
    async fn apply(
        &self,
        change: &PendingChange,
        current: Option<&McpServer>,
    ) -> McpRuntimeResult<()>;
}

/// Errors returned by runtime adapters.
#[derive(Debug, Clone, Error)]
pub enum McpRuntimeError {
    /// The runtime refused the change.
    #[error("runtime rejected change: {0}")]
    Rejected(String),

    /// The runtime could not be reached or written.
    #[error("runtime unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl McpRuntimeError {
    /// Wraps an I/O or transport failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
