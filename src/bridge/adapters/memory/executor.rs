//! Scripted flow executor for tests and local runs.

use crate::bridge::ports::{FlowExecutor, FlowExecutorError, FlowExecutorResult};
use crate::publication::domain::{AgentComponent, AgentComponentId};
use crate::skill::domain::{Workflow, WorkflowId};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Executor that echoes the input message and records each call.
///
/// Workflows can be scripted to fail or to stall for a fixed delay.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFlowExecutor {
    state: Arc<RwLock<ExecutorState>>,
}

#[derive(Debug, Default)]
struct ExecutorState {
    calls: Vec<(AgentComponentId, WorkflowId)>,
    failures: HashMap<WorkflowId, String>,
    delays: HashMap<WorkflowId, Duration>,
}

impl InMemoryFlowExecutor {
    /// Creates an executor with no scripted behaviour.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes calls to `workflow_id` fail with `reason`.
    pub fn fail_with(&self, workflow_id: WorkflowId, reason: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state.failures.insert(workflow_id, reason.into());
        }
    }

    /// Makes calls to `workflow_id` sleep for `delay` before answering.
    pub fn stall(&self, workflow_id: WorkflowId, delay: Duration) {
        if let Ok(mut state) = self.state.write() {
            state.delays.insert(workflow_id, delay);
        }
    }

    /// Returns `(agent, workflow)` pairs in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<(AgentComponentId, WorkflowId)> {
        self.state
            .read()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FlowExecutor for InMemoryFlowExecutor {
    async fn execute(
        &self,
        agent: &AgentComponent,
        workflow: &Workflow,
        arguments: &Value,
    ) -> FlowExecutorResult<String> {
        let (failure, delay) = {
            let mut state = self.state.write().map_err(|err| {
                FlowExecutorError::unavailable(std::io::Error::other(err.to_string()))
            })?;
            state.calls.push((agent.id(), workflow.id()));
            (
                state.failures.get(&workflow.id()).cloned(),
                state.delays.get(&workflow.id()).copied(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = failure {
            return Err(FlowExecutorError::Failed(reason));
        }

        let message = arguments
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(format!("{}: {message}", agent.persona().name()))
    }
}
