//! Service layer for publishing and unpublishing agent components.

use crate::publication::{
    domain::{
        AgentComponent, AgentComponentId, AgentPersona, PublicationDomainError, PublishOutcome,
    },
    ports::{AgentComponentRepository, AgentComponentRepositoryError},
};
use crate::tenant::TenantId;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Number of attempts made when a concurrent publisher wins the race.
const MAX_PUBLISH_ATTEMPTS: u32 = 5;

/// Base delay between publish attempts; multiplied by the attempt number.
const PUBLISH_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Request payload for authoring a new agent component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateAgentComponentRequest {
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional "who is this agent" answer.
    pub qa_who: Option<String>,
    /// Optional rules answer.
    pub qa_rules: Option<String>,
}

impl CreateAgentComponentRequest {
    /// Creates a request with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Service-level errors for publication operations.
#[derive(Debug, Error)]
pub enum PublicationServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] PublicationDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] AgentComponentRepositoryError),
    /// No component with the given identifier exists for the tenant.
    #[error("agent component {0} not found")]
    NotFound(AgentComponentId),
}

/// Result type for publication service operations.
pub type PublicationServiceResult<T> = Result<T, PublicationServiceError>;

/// Publication registry service.
///
/// Every lookup is scoped to the calling tenant; a component owned by another
/// tenant is reported as not found.
pub struct PublicationService<R, C>
where
    R: AgentComponentRepository + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> PublicationService<R, C>
where
    R: AgentComponentRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new publication service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    async fn find_owned_or_error(
        &self,
        tenant_id: TenantId,
        agent_id: AgentComponentId,
    ) -> PublicationServiceResult<AgentComponent> {
        self.repository
            .find_by_id(agent_id)
            .await?
            .filter(|agent| agent.tenant_id() == tenant_id)
            .ok_or(PublicationServiceError::NotFound(agent_id))
    }

    /// Creates a new, unpublished agent component.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationServiceError::Domain`] when the persona is invalid
    /// or repository errors when persistence fails.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        request: CreateAgentComponentRequest,
    ) -> PublicationServiceResult<AgentComponent> {
        let persona = AgentPersona::new(request.name)?
            .with_description(request.description)
            .with_qa_who(request.qa_who)
            .with_qa_rules(request.qa_rules);
        let agent = AgentComponent::new(tenant_id, persona, &*self.clock);
        self.repository.store(&agent).await?;
        tracing::info!(tenant_id = %tenant_id, agent_id = %agent.id(), "agent component created");
        Ok(agent)
    }

    /// Returns a component owned by the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationServiceError::NotFound`] when the component does
    /// not exist for the tenant.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        agent_id: AgentComponentId,
    ) -> PublicationServiceResult<AgentComponent> {
        self.find_owned_or_error(tenant_id, agent_id).await
    }

    /// Lists the tenant's components.
    ///
    /// # Errors
    ///
    /// Returns persistence-layer errors from the repository.
    pub async fn list(&self, tenant_id: TenantId) -> PublicationServiceResult<Vec<AgentComponent>> {
        Ok(self.repository.list_by_tenant(tenant_id).await?)
    }

    /// Returns the tenant's live agent, if one is published.
    ///
    /// # Errors
    ///
    /// Returns persistence-layer errors from the repository.
    pub async fn current_live(
        &self,
        tenant_id: TenantId,
    ) -> PublicationServiceResult<Option<AgentComponent>> {
        Ok(self.repository.find_published(tenant_id).await?)
    }

    /// Publishes a component, demoting whichever component was live before.
    ///
    /// Lost races against concurrent publishers are retried.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationServiceError::NotFound`] when the component does
    /// not exist for the tenant. Returns
    /// [`AgentComponentRepositoryError::Conflict`] only when every retry lost.
    pub async fn publish(
        &self,
        tenant_id: TenantId,
        agent_id: AgentComponentId,
    ) -> PublicationServiceResult<PublishOutcome> {
        self.find_owned_or_error(tenant_id, agent_id).await?;

        let mut attempt = 1;
        loop {
            match self
                .repository
                .publish_exclusive(agent_id, self.clock.utc())
                .await
            {
                Ok(outcome) => {
                    tracing::info!(
                        tenant_id = %tenant_id,
                        agent_id = %agent_id,
                        demoted = ?outcome.demoted(),
                        "agent component published"
                    );
                    return Ok(outcome);
                }
                Err(AgentComponentRepositoryError::Conflict) if attempt < MAX_PUBLISH_ATTEMPTS => {
                    tracing::debug!(agent_id = %agent_id, attempt, "publish conflict; retrying");
                    tokio::time::sleep(PUBLISH_RETRY_DELAY * attempt).await;
                    attempt += 1;
                }
                Err(AgentComponentRepositoryError::NotFound(id)) => {
                    return Err(PublicationServiceError::NotFound(id));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Unpublishes a component. Calling this on an unpublished component
    /// returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationServiceError::NotFound`] when the component does
    /// not exist for the tenant.
    pub async fn unpublish(
        &self,
        tenant_id: TenantId,
        agent_id: AgentComponentId,
    ) -> PublicationServiceResult<AgentComponent> {
        self.find_owned_or_error(tenant_id, agent_id).await?;
        let outcome = match self.repository.unpublish(agent_id, self.clock.utc()).await {
            Ok(outcome) => outcome,
            Err(AgentComponentRepositoryError::NotFound(id)) => {
                return Err(PublicationServiceError::NotFound(id));
            }
            Err(err) => return Err(err.into()),
        };

        if outcome.changed() {
            tracing::info!(tenant_id = %tenant_id, agent_id = %agent_id, "agent component unpublished");
        }
        Ok(outcome.into_agent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publication::{
        adapters::memory::InMemoryAgentComponentRepository,
        domain::{PublishOutcome, UnpublishOutcome},
        ports::AgentComponentRepositoryResult,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};
    use std::sync::atomic::{AtomicU32, Ordering};

    type TestService = PublicationService<InMemoryAgentComponentRepository, DefaultClock>;

    #[fixture]
    fn service() -> TestService {
        PublicationService::new(
            Arc::new(InMemoryAgentComponentRepository::new()),
            Arc::new(DefaultClock),
        )
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn publishing_another_tenants_agent_is_not_found(service: TestService) {
        let owner = TenantId::new();
        let agent = service
            .create(owner, CreateAgentComponentRequest::new("Charlie"))
            .await
            .expect("agent should be created");

        let result = service.publish(TenantId::new(), agent.id()).await;

        assert!(matches!(result, Err(PublicationServiceError::NotFound(_))));
        let stored = service
            .get(owner, agent.id())
            .await
            .expect("agent should still exist");
        assert!(!stored.is_published());
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn publish_reports_demoted_component(service: TestService) {
        let tenant_id = TenantId::new();
        let first = service
            .create(tenant_id, CreateAgentComponentRequest::new("First"))
            .await
            .expect("first agent should be created");
        let second = service
            .create(tenant_id, CreateAgentComponentRequest::new("Second"))
            .await
            .expect("second agent should be created");

        service
            .publish(tenant_id, first.id())
            .await
            .expect("first publish should succeed");
        let outcome = service
            .publish(tenant_id, second.id())
            .await
            .expect("second publish should succeed");

        assert_eq!(outcome.demoted(), [first.id()]);
        assert!(outcome.agent().is_published());
    }

    /// Repository that loses the first `losses` publish races.
    struct ContendedRepository {
        inner: InMemoryAgentComponentRepository,
        losses: u32,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl AgentComponentRepository for ContendedRepository {
        async fn store(&self, agent: &AgentComponent) -> AgentComponentRepositoryResult<()> {
            self.inner.store(agent).await
        }

        async fn find_by_id(
            &self,
            agent_id: AgentComponentId,
        ) -> AgentComponentRepositoryResult<Option<AgentComponent>> {
            self.inner.find_by_id(agent_id).await
        }

        async fn list_by_tenant(
            &self,
            tenant_id: TenantId,
        ) -> AgentComponentRepositoryResult<Vec<AgentComponent>> {
            self.inner.list_by_tenant(tenant_id).await
        }

        async fn find_published(
            &self,
            tenant_id: TenantId,
        ) -> AgentComponentRepositoryResult<Option<AgentComponent>> {
            self.inner.find_published(tenant_id).await
        }

        async fn publish_exclusive(
            &self,
            agent_id: AgentComponentId,
            published_at: DateTime<Utc>,
        ) -> AgentComponentRepositoryResult<PublishOutcome> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.losses {
                return Err(AgentComponentRepositoryError::Conflict);
            }
            self.inner.publish_exclusive(agent_id, published_at).await
        }

        async fn unpublish(
            &self,
            agent_id: AgentComponentId,
            unpublished_at: DateTime<Utc>,
        ) -> AgentComponentRepositoryResult<UnpublishOutcome> {
            self.inner.unpublish(agent_id, unpublished_at).await
        }
    }

    fn contended_service(losses: u32) -> PublicationService<ContendedRepository, DefaultClock> {
        PublicationService::new(
            Arc::new(ContendedRepository {
                inner: InMemoryAgentComponentRepository::new(),
                losses,
                attempts: AtomicU32::new(0),
            }),
            Arc::new(DefaultClock),
        )
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn conflicts_are_retried_transparently() {
        let service = contended_service(2);
        let tenant_id = TenantId::new();
        let agent = service
            .create(tenant_id, CreateAgentComponentRequest::new("Charlie"))
            .await
            .expect("agent should be created");

        let outcome = service
            .publish(tenant_id, agent.id())
            .await
            .expect("publish should succeed after retries");

        assert!(outcome.agent().is_published());
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn conflict_surfaces_after_retries_are_exhausted() {
        let service = contended_service(MAX_PUBLISH_ATTEMPTS);
        let tenant_id = TenantId::new();
        let agent = service
            .create(tenant_id, CreateAgentComponentRequest::new("Charlie"))
            .await
            .expect("agent should be created");

        let result = service.publish(tenant_id, agent.id()).await;

        assert!(matches!(
            result,
            Err(PublicationServiceError::Repository(
                AgentComponentRepositoryError::Conflict
            ))
        ));
    }
}
