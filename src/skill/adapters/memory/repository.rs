//! In-memory repository for workflows.

use crate::skill::{
    domain::{Workflow, WorkflowId},
    ports::{WorkflowRepository, WorkflowRepositoryError, WorkflowRepositoryResult},
};
use crate::tenant::TenantId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory workflow repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowRepository {
    workflows: Arc<RwLock<HashMap<WorkflowId, Workflow>>>,
}

impl InMemoryWorkflowRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_sorted(
        &self,
        predicate: impl Fn(&Workflow) -> bool,
    ) -> WorkflowRepositoryResult<Vec<Workflow>> {
        let workflows = self.workflows.read().map_err(|err| {
            WorkflowRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut matching: Vec<Workflow> = workflows
            .values()
            .filter(|workflow| predicate(workflow))
            .cloned()
            .collect();
        matching.sort_by_key(Workflow::created_at);
        Ok(matching)
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn store(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()> {
        let mut workflows = self.workflows.write().map_err(|err| {
            WorkflowRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if workflows.contains_key(&workflow.id()) {
            return Err(WorkflowRepositoryError::DuplicateWorkflow(workflow.id()));
        }
        workflows.insert(workflow.id(), workflow.clone());
        Ok(())
    }

    async fn update(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()> {
        let mut workflows = self.workflows.write().map_err(|err| {
            WorkflowRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let stored = workflows
            .get_mut(&workflow.id())
            .ok_or(WorkflowRepositoryError::NotFound(workflow.id()))?;
        *stored = workflow.clone();
        Ok(())
    }

    async fn find_by_id(
        &self,
        workflow_id: WorkflowId,
    ) -> WorkflowRepositoryResult<Option<Workflow>> {
        let workflows = self.workflows.read().map_err(|err| {
            WorkflowRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(workflows.get(&workflow_id).cloned())
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> WorkflowRepositoryResult<Vec<Workflow>> {
        self.collect_sorted(|workflow| workflow.tenant_id() == tenant_id)
    }

    async fn list_skills(&self, tenant_id: TenantId) -> WorkflowRepositoryResult<Vec<Workflow>> {
        self.collect_sorted(|workflow| {
            workflow.tenant_id() == tenant_id && workflow.is_exposed_skill()
        })
    }
}
