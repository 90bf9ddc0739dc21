//! Repository port for agent component persistence and publication.

use crate::publication::domain::{
    AgentComponent, AgentComponentId, PublishOutcome, UnpublishOutcome,
};
use crate::tenant::TenantId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for agent component repository operations.
pub type AgentComponentRepositoryResult<T> = Result<T, AgentComponentRepositoryError>;

/// Persistence contract for agent components.
///
/// Implementations must make [`publish_exclusive`] atomic: no reader may
/// observe two published components for the same tenant, and two concurrent
/// publishers must not both succeed in leaving their component published.
///
/// [`publish_exclusive`]: AgentComponentRepository::publish_exclusive
#[async_trait]
pub trait AgentComponentRepository: Send + Sync {
    /// Stores a new component.
    ///
    /// # Errors
    ///
    /// Returns [`AgentComponentRepositoryError::DuplicateAgent`] when the ID
    /// already exists, or [`AgentComponentRepositoryError::Conflict`] when the
    /// component is published and its tenant already has a published one.
    async fn store(&self, agent: &AgentComponent) -> AgentComponentRepositoryResult<()>;

    /// Finds a component by identifier.
    async fn find_by_id(
        &self,
        agent_id: AgentComponentId,
    ) -> AgentComponentRepositoryResult<Option<AgentComponent>>;

    /// Returns every component owned by `tenant_id`, oldest first.
    async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> AgentComponentRepositoryResult<Vec<AgentComponent>>;

    /// Returns the tenant's published component, if any.
    async fn find_published(
        &self,
        tenant_id: TenantId,
    ) -> AgentComponentRepositoryResult<Option<AgentComponent>>;

    /// Demotes every other published component of the target's tenant and
    /// publishes the target, as one atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`AgentComponentRepositoryError::NotFound`] when the target does
    /// not exist (nothing is changed), or
    /// [`AgentComponentRepositoryError::Conflict`] when a concurrent publisher
    /// won the race; callers may retry.
    async fn publish_exclusive(
        &self,
        agent_id: AgentComponentId,
        published_at: DateTime<Utc>,
    ) -> AgentComponentRepositoryResult<PublishOutcome>;

    /// Clears the published flag of a component. Unpublishing an unpublished
    /// component succeeds without changes.
    ///
    /// # Errors
    ///
    /// Returns [`AgentComponentRepositoryError::NotFound`] when the component
    /// does not exist.
    async fn unpublish(
        &self,
        agent_id: AgentComponentId,
        unpublished_at: DateTime<Utc>,
    ) -> AgentComponentRepositoryResult<UnpublishOutcome>;
}

/// Errors returned by agent component repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AgentComponentRepositoryError {
    /// A component with the same identifier already exists.
    #[error("duplicate agent component identifier: {0}")]
    DuplicateAgent(AgentComponentId),

    /// The component was not found.
    #[error("agent component not found: {0}")]
    NotFound(AgentComponentId),

    /// A concurrent publication changed the tenant's live agent first.
    #[error("concurrent publication conflict")]
    Conflict,

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted agent component data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AgentComponentRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
