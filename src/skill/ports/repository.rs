//! Repository port for workflow persistence.

use crate::skill::domain::{Workflow, WorkflowId};
use crate::tenant::TenantId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for workflow repository operations.
pub type WorkflowRepositoryResult<T> = Result<T, WorkflowRepositoryError>;

/// Persistence contract for workflows.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Stores a new workflow.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::DuplicateWorkflow`] when the ID
    /// already exists.
    async fn store(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()>;

    /// Persists changes to an existing workflow.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::NotFound`] when the workflow does
    /// not exist.
    async fn update(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()>;

    /// Finds a workflow by identifier.
    async fn find_by_id(&self, workflow_id: WorkflowId)
    -> WorkflowRepositoryResult<Option<Workflow>>;

    /// Returns every workflow owned by `tenant_id`, oldest first.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> WorkflowRepositoryResult<Vec<Workflow>>;

    /// Returns the tenant's active workflows flagged as skills, oldest first.
    async fn list_skills(&self, tenant_id: TenantId) -> WorkflowRepositoryResult<Vec<Workflow>>;
}

/// Errors returned by workflow repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowRepositoryError {
    /// A workflow with the same identifier already exists.
    #[error("duplicate workflow identifier: {0}")]
    DuplicateWorkflow(WorkflowId),

    /// The workflow was not found.
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted workflow data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
