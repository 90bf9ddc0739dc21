//! Workflow aggregate root.

use super::{WorkflowId, WorkflowName, slugify};
use crate::publication::domain::AgentComponentId;
use crate::tenant::TenantId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Workflow aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    id: WorkflowId,
    tenant_id: TenantId,
    name: WorkflowName,
    description: Option<String>,
    is_active: bool,
    is_agent_skill: bool,
    agent_component_ids: BTreeSet<AgentComponentId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted workflow state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedWorkflowData {
    /// Persisted workflow identifier.
    pub id: WorkflowId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Persisted name.
    pub name: WorkflowName,
    /// Persisted description.
    pub description: Option<String>,
    /// Whether the workflow is active.
    pub is_active: bool,
    /// Whether the workflow is exposed as a skill.
    pub is_agent_skill: bool,
    /// Agent components the workflow belongs to.
    pub agent_component_ids: BTreeSet<AgentComponentId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Creates a new active workflow that is not exposed as a skill.
    #[must_use]
    pub fn new(tenant_id: TenantId, name: WorkflowName, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: WorkflowId::new(),
            tenant_id,
            name,
            description: None,
            is_active: true,
            is_agent_skill: false,
            agent_component_ids: BTreeSet::new(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a workflow from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedWorkflowData) -> Self {
        Self {
            id: data.id,
            tenant_id: data.tenant_id,
            name: data.name,
            description: data.description,
            is_active: data.is_active,
            is_agent_skill: data.is_agent_skill,
            agent_component_ids: data.agent_component_ids,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());
        self
    }

    /// Sets whether the workflow is active.
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Associates the workflow with agent components.
    #[must_use]
    pub fn with_agent_components(
        mut self,
        agent_component_ids: impl IntoIterator<Item = AgentComponentId>,
    ) -> Self {
        self.agent_component_ids = agent_component_ids.into_iter().collect();
        self
    }

    /// Returns the workflow identifier.
    #[must_use]
    pub const fn id(&self) -> WorkflowId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the workflow name.
    #[must_use]
    pub const fn name(&self) -> &WorkflowName {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the workflow is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the workflow is flagged as a skill.
    #[must_use]
    pub const fn is_agent_skill(&self) -> bool {
        self.is_agent_skill
    }

    /// Returns whether bridges may call this workflow right now.
    #[must_use]
    pub const fn is_exposed_skill(&self) -> bool {
        self.is_agent_skill && self.is_active
    }

    /// Returns the agent components the workflow belongs to.
    #[must_use]
    pub const fn agent_component_ids(&self) -> &BTreeSet<AgentComponentId> {
        &self.agent_component_ids
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the tool name bridges use to call this workflow.
    #[must_use]
    pub fn tool_name(&self) -> String {
        slugify(self.name.as_str())
    }

    /// Sets the skill flag. Returns whether the flag changed.
    pub fn set_agent_skill(&mut self, is_agent_skill: bool, clock: &impl Clock) -> bool {
        if self.is_agent_skill == is_agent_skill {
            return false;
        }

        self.is_agent_skill = is_agent_skill;
        self.updated_at = clock.utc();
        true
    }
}
