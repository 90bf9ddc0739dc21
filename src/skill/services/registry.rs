//! Service layer for toggling workflows as skills.

use crate::publication::domain::AgentComponentId;
use crate::skill::{
    domain::{SkillDomainError, Workflow, WorkflowId, WorkflowName},
    ports::{WorkflowRepository, WorkflowRepositoryError},
};
use crate::tenant::TenantId;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for authoring a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWorkflowRequest {
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Whether the workflow starts active.
    pub is_active: bool,
    /// Agent components the workflow belongs to.
    pub agent_component_ids: Vec<AgentComponentId>,
}

impl CreateWorkflowRequest {
    /// Creates a request for an active workflow with no agent links.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_active: true,
            agent_component_ids: Vec::new(),
        }
    }
}

/// Service-level errors for skill registry operations.
#[derive(Debug, Error)]
pub enum SkillRegistryServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] SkillDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] WorkflowRepositoryError),
    /// No workflow with the given identifier exists for the tenant.
    #[error("workflow {0} not found")]
    NotFound(WorkflowId),
}

/// Result type for skill registry operations.
pub type SkillRegistryServiceResult<T> = Result<T, SkillRegistryServiceError>;

/// Skill registry service.
pub struct SkillRegistryService<R, C>
where
    R: WorkflowRepository + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> SkillRegistryService<R, C>
where
    R: WorkflowRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new skill registry service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    async fn find_owned_or_error(
        &self,
        tenant_id: TenantId,
        workflow_id: WorkflowId,
    ) -> SkillRegistryServiceResult<Workflow> {
        self.repository
            .find_by_id(workflow_id)
            .await?
            .filter(|workflow| workflow.tenant_id() == tenant_id)
            .ok_or(SkillRegistryServiceError::NotFound(workflow_id))
    }

    /// Creates a workflow.
    ///
    /// # Errors
    ///
    /// Returns domain errors for invalid names and repository errors when
    /// persistence fails.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        request: CreateWorkflowRequest,
    ) -> SkillRegistryServiceResult<Workflow> {
        let name = WorkflowName::new(request.name)?;
        let workflow = Workflow::new(tenant_id, name, &*self.clock)
            .with_description(request.description)
            .with_active(request.is_active)
            .with_agent_components(request.agent_component_ids);
        self.repository.store(&workflow).await?;
        Ok(workflow)
    }

    /// Returns a workflow owned by the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`SkillRegistryServiceError::NotFound`] when the workflow does
    /// not exist for the tenant.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        workflow_id: WorkflowId,
    ) -> SkillRegistryServiceResult<Workflow> {
        self.find_owned_or_error(tenant_id, workflow_id).await
    }

    /// Lists the tenant's workflows.
    ///
    /// # Errors
    ///
    /// Returns persistence-layer errors from the repository.
    pub async fn list(&self, tenant_id: TenantId) -> SkillRegistryServiceResult<Vec<Workflow>> {
        Ok(self.repository.list_by_tenant(tenant_id).await?)
    }

    /// Lists the tenant's workflows that bridges may call.
    ///
    /// # Errors
    ///
    /// Returns persistence-layer errors from the repository.
    pub async fn list_skills(
        &self,
        tenant_id: TenantId,
    ) -> SkillRegistryServiceResult<Vec<Workflow>> {
        Ok(self.repository.list_skills(tenant_id).await?)
    }

    /// Sets whether a workflow is exposed as a skill.
    ///
    /// Publication state of agent components is never read or changed here.
    ///
    /// # Errors
    ///
    /// Returns [`SkillRegistryServiceError::NotFound`] when the workflow does
    /// not exist for the tenant.
    pub async fn set_skill(
        &self,
        tenant_id: TenantId,
        workflow_id: WorkflowId,
        is_agent_skill: bool,
    ) -> SkillRegistryServiceResult<Workflow> {
        let mut workflow = self.find_owned_or_error(tenant_id, workflow_id).await?;
        if workflow.set_agent_skill(is_agent_skill, &*self.clock) {
            self.repository.update(&workflow).await?;
            tracing::info!(
                tenant_id = %tenant_id,
                workflow_id = %workflow_id,
                is_agent_skill,
                "workflow skill exposure changed"
            );
        }
        Ok(workflow)
    }
}
