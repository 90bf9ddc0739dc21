//! In-memory repository for agent components.

use crate::publication::{
    domain::{AgentComponent, AgentComponentId, PublishOutcome, UnpublishOutcome},
    ports::{
        AgentComponentRepository, AgentComponentRepositoryError, AgentComponentRepositoryResult,
    },
};
use crate::tenant::TenantId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory agent component repository.
///
/// Publication runs entirely under the write lock, so demotion and promotion
/// are observed as one step.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentComponentRepository {
    state: Arc<RwLock<InMemoryAgentState>>,
}

#[derive(Debug, Default)]
struct InMemoryAgentState {
    agents: HashMap<AgentComponentId, AgentComponent>,
}

impl InMemoryAgentComponentRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AgentComponentRepositoryResult<RwLockReadGuard<'_, InMemoryAgentState>> {
        self.state.read().map_err(|err| {
            AgentComponentRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> AgentComponentRepositoryResult<RwLockWriteGuard<'_, InMemoryAgentState>> {
        self.state.write().map_err(|err| {
            AgentComponentRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl AgentComponentRepository for InMemoryAgentComponentRepository {
    async fn store(&self, agent: &AgentComponent) -> AgentComponentRepositoryResult<()> {
        let mut state = self.write()?;

        if state.agents.contains_key(&agent.id()) {
            return Err(AgentComponentRepositoryError::DuplicateAgent(agent.id()));
        }

        let tenant_has_live_agent = state
            .agents
            .values()
            .any(|stored| stored.tenant_id() == agent.tenant_id() && stored.is_published());
        if agent.is_published() && tenant_has_live_agent {
            return Err(AgentComponentRepositoryError::Conflict);
        }

        state.agents.insert(agent.id(), agent.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        agent_id: AgentComponentId,
    ) -> AgentComponentRepositoryResult<Option<AgentComponent>> {
        Ok(self.read()?.agents.get(&agent_id).cloned())
    }

    async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> AgentComponentRepositoryResult<Vec<AgentComponent>> {
        let state = self.read()?;
        let mut agents: Vec<AgentComponent> = state
            .agents
            .values()
            .filter(|agent| agent.tenant_id() == tenant_id)
            .cloned()
            .collect();
        agents.sort_by_key(AgentComponent::created_at);
        Ok(agents)
    }

    async fn find_published(
        &self,
        tenant_id: TenantId,
    ) -> AgentComponentRepositoryResult<Option<AgentComponent>> {
        let state = self.read()?;
        Ok(state
            .agents
            .values()
            .find(|agent| agent.tenant_id() == tenant_id && agent.is_published())
            .cloned())
    }

    async fn publish_exclusive(
        &self,
        agent_id: AgentComponentId,
        published_at: DateTime<Utc>,
    ) -> AgentComponentRepositoryResult<PublishOutcome> {
        let mut state = self.write()?;

        let tenant_id = state
            .agents
            .get(&agent_id)
            .ok_or(AgentComponentRepositoryError::NotFound(agent_id))?
            .tenant_id();

        let mut demoted = Vec::new();
        for agent in state.agents.values_mut() {
            if agent.id() != agent_id
                && agent.tenant_id() == tenant_id
                && agent.mark_unpublished(published_at)
            {
                demoted.push(agent.id());
            }
        }

        let target = state
            .agents
            .get_mut(&agent_id)
            .ok_or(AgentComponentRepositoryError::NotFound(agent_id))?;
        target.mark_published(published_at);
        Ok(PublishOutcome::new(target.clone(), demoted))
    }

    async fn unpublish(
        &self,
        agent_id: AgentComponentId,
        unpublished_at: DateTime<Utc>,
    ) -> AgentComponentRepositoryResult<UnpublishOutcome> {
        let mut state = self.write()?;
        let agent = state
            .agents
            .get_mut(&agent_id)
            .ok_or(AgentComponentRepositoryError::NotFound(agent_id))?;
        let changed = agent.mark_unpublished(unpublished_at);
        Ok(UnpublishOutcome::new(agent.clone(), changed))
    }
}
