//! Agent component aggregate root.

use super::{AgentComponentId, AgentPersona};
use crate::tenant::TenantId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Agent component aggregate root.
///
/// Publication state is only changed through the publication registry, which
/// guarantees that at most one component per tenant is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentComponent {
    id: AgentComponentId,
    tenant_id: TenantId,
    persona: AgentPersona,
    is_published: bool,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted agent component state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAgentComponentData {
    /// Persisted component identifier.
    pub id: AgentComponentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Persisted persona fields.
    pub persona: AgentPersona,
    /// Persisted publication flag.
    pub is_published: bool,
    /// Timestamp of the current publication, if published.
    pub published_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl AgentComponent {
    /// Creates a new, unpublished agent component.
    #[must_use]
    pub fn new(tenant_id: TenantId, persona: AgentPersona, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: AgentComponentId::new(),
            tenant_id,
            persona,
            is_published: false,
            published_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a component from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedAgentComponentData) -> Self {
        Self {
            id: data.id,
            tenant_id: data.tenant_id,
            persona: data.persona,
            is_published: data.is_published,
            published_at: data.published_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the component identifier.
    #[must_use]
    pub const fn id(&self) -> AgentComponentId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the authored persona.
    #[must_use]
    pub const fn persona(&self) -> &AgentPersona {
        &self.persona
    }

    /// Returns whether this component is the tenant's live agent.
    #[must_use]
    pub const fn is_published(&self) -> bool {
        self.is_published
    }

    /// Returns when the component was published, if it is published.
    #[must_use]
    pub const fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
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

    /// Marks the component as published at `timestamp`.
    ///
    /// Returns `false` when the component was already published; the existing
    /// publication timestamp is kept in that case.
    pub fn mark_published(&mut self, timestamp: DateTime<Utc>) -> bool {
        if self.is_published {
            return false;
        }

        self.is_published = true;
        self.published_at = Some(timestamp);
        self.updated_at = timestamp;
        true
    }

    /// Marks the component as unpublished at `timestamp`.
    ///
    /// Returns `false` when the component was not published.
    pub fn mark_unpublished(&mut self, timestamp: DateTime<Utc>) -> bool {
        if !self.is_published {
            return false;
        }

        self.is_published = false;
        self.published_at = None;
        self.updated_at = timestamp;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;

    fn build_agent() -> AgentComponent {
        let persona = AgentPersona::new("Charlie").expect("valid persona");
        AgentComponent::new(TenantId::new(), persona, &DefaultClock)
    }

    #[test]
    fn new_components_start_unpublished() {
        let agent = build_agent();

        assert!(!agent.is_published());
        assert_eq!(agent.published_at(), None);
    }

    #[test]
    fn publishing_twice_keeps_first_timestamp() {
        let mut agent = build_agent();
        let first = Utc::now();

        assert!(agent.mark_published(first));
        assert!(!agent.mark_published(first + chrono::Duration::seconds(5)));
        assert_eq!(agent.published_at(), Some(first));
    }

    #[test]
    fn unpublishing_is_idempotent() {
        let mut agent = build_agent();
        agent.mark_published(Utc::now());

        assert!(agent.mark_unpublished(Utc::now()));
        assert!(!agent.mark_unpublished(Utc::now()));
        assert!(!agent.is_published());
    }
}
