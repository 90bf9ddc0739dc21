//! Pending runtime changes queued by registry mutations.

use super::{
    McpServer, McpServerId, ParseChangeEntityError, ParseChangeKindError, PendingChangeId,
};
use crate::tenant::TenantId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of registry mutation recorded in the change queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A server was registered.
    Create,
    /// Server configuration changed.
    Update,
    /// A server was enabled.
    Enable,
    /// A server was disabled.
    Disable,
    /// A server was removed.
    Delete,
}

impl ChangeKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ChangeKind {
    type Error = ParseChangeKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "enable" => Ok(Self::Enable),
            "disable" => Ok(Self::Disable),
            "delete" => Ok(Self::Delete),
            _ => Err(ParseChangeKindError(value.to_owned())),
        }
    }
}

/// Type of entity a pending change refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeEntity {
    /// An MCP server configuration.
    McpServer,
}

impl ChangeEntity {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::McpServer => "mcp_server",
        }
    }
}

impl TryFrom<&str> for ChangeEntity {
    type Error = ParseChangeEntityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "mcp_server" => Ok(Self::McpServer),
            _ => Err(ParseChangeEntityError(value.to_owned())),
        }
    }
}

/// Queued change that has not yet been applied to the flow runtime.
///
/// Entries are append-only and are removed only once applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
    id: PendingChangeId,
    tenant_id: TenantId,
    entity_type: ChangeEntity,
    entity_id: Uuid,
    entity_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    previous_name: Option<String>,
    kind: ChangeKind,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted pending change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPendingChangeData {
    /// Persisted change identifier.
    pub id: PendingChangeId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Entity type.
    pub entity_type: ChangeEntity,
    /// Entity identifier.
    pub entity_id: Uuid,
    /// Entity name when the change was recorded.
    pub entity_name: String,
    /// Name the entity had before a rename.
    pub previous_name: Option<String>,
    /// Change kind.
    pub kind: ChangeKind,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PendingChange {
    /// Records a change to `server`.
    #[must_use]
    pub fn for_server(server: &McpServer, kind: ChangeKind, clock: &impl Clock) -> Self {
        Self {
            id: PendingChangeId::new(),
            tenant_id: server.tenant_id(),
            entity_type: ChangeEntity::McpServer,
            entity_id: server.id().into_inner(),
            entity_name: server.name().as_str().to_owned(),
            previous_name: None,
            kind,
            created_at: clock.utc(),
        }
    }

    /// Records the name the server had before this change, if it differs.
    #[must_use]
    pub fn with_previous_name(mut self, previous_name: &str) -> Self {
        if previous_name != self.entity_name {
            self.previous_name = Some(previous_name.to_owned());
        }
        self
    }

    /// Reconstructs a change from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedPendingChangeData) -> Self {
        Self {
            id: data.id,
            tenant_id: data.tenant_id,
            entity_type: data.entity_type,
            entity_id: data.entity_id,
            entity_name: data.entity_name,
            previous_name: data.previous_name,
            kind: data.kind,
            created_at: data.created_at,
        }
    }

    /// Returns the change identifier.
    #[must_use]
    pub const fn id(&self) -> PendingChangeId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the entity type.
    #[must_use]
    pub const fn entity_type(&self) -> ChangeEntity {
        self.entity_type
    }

    /// Returns the entity identifier.
    #[must_use]
    pub const fn entity_id(&self) -> Uuid {
        self.entity_id
    }

    /// Returns the affected MCP server, if the entity is one.
    #[must_use]
    pub const fn server_id(&self) -> Option<McpServerId> {
        match self.entity_type {
            ChangeEntity::McpServer => Some(McpServerId::from_uuid(self.entity_id)),
        }
    }

    /// Returns the entity name when the change was recorded.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Returns the entity's name before a rename.
    #[must_use]
    pub fn previous_name(&self) -> Option<&str> {
        self.previous_name.as_deref()
    }

    /// Returns the change kind.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Returns when the change was queued.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_registry::domain::{McpServerName, McpTransport};
    use mockable::DefaultClock;
    use rstest::rstest;

    #[rstest]
    #[case("create", ChangeKind::Create)]
    #[case("disable", ChangeKind::Disable)]
    #[case("delete", ChangeKind::Delete)]
    fn change_kinds_parse_from_storage(#[case] raw: &str, #[case] expected: ChangeKind) {
        assert_eq!(ChangeKind::try_from(raw), Ok(expected));
    }

    #[test]
    fn unknown_change_kind_is_rejected() {
        assert!(ChangeKind::try_from("restart").is_err());
    }

    #[test]
    fn previous_name_is_kept_only_for_renames() {
        let name = McpServerName::new("docs").expect("valid name");
        let transport = McpTransport::stdio("uvx").expect("valid transport");
        let server = McpServer::new(TenantId::new(), name, transport, &DefaultClock);

        let unchanged = PendingChange::for_server(&server, ChangeKind::Update, &DefaultClock)
            .with_previous_name("docs");
        let renamed = PendingChange::for_server(&server, ChangeKind::Update, &DefaultClock)
            .with_previous_name("wiki");

        assert_eq!(unchanged.previous_name(), None);
        assert_eq!(renamed.previous_name(), Some("wiki"));
        assert_eq!(renamed.server_id(), Some(server.id()));
    }
}
