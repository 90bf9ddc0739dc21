//! Port for running a tool call against the live agent's flow.

use crate::publication::domain::AgentComponent;
use crate::skill::domain::Workflow;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for flow execution.
pub type FlowExecutorResult<T> = Result<T, FlowExecutorError>;

/// Flow runtime that processes a tool call as a fresh chat turn.
#[async_trait]
pub trait FlowExecutor: Send + Sync {
    /// Runs `workflow` on behalf of `agent` and returns the response text.
    ///
    /// `arguments` is the tool-call argument object; its `message` field is
    /// the chat input.
    ///
    /// # Errors
    ///
    /// Returns [`FlowExecutorError`] when the flow fails or the runtime is
    /// unreachable.
    async fn execute(
        &self,
        agent: &AgentComponent,
        workflow: &Workflow,
        arguments: &Value,
    ) -> FlowExecutorResult<String>;
}

/// Errors returned by flow executors.
#[derive(Debug, Clone, Error)]
pub enum FlowExecutorError {
    /// The flow ran and reported a failure.
    #[error("workflow error: {0}")]
    Failed(String),

    /// The runtime could not be reached.
    #[error("flow runtime unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl FlowExecutorError {
    /// Wraps a transport failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
