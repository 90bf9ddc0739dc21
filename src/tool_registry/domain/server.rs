//! MCP server aggregate root.

use super::{
    ChangeKind, McpCredentials, McpServerHealthSnapshot, McpServerId, McpServerName, McpTransport,
};
use crate::tenant::TenantId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// MCP server configured for a tenant's flow runtime.
///
/// Every configuration mutator sets `needs_sync`; only a successful sync
/// clears it. Health is tracked separately and never affects sync state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServer {
    id: McpServerId,
    tenant_id: TenantId,
    name: McpServerName,
    description: Option<String>,
    transport: McpTransport,
    #[serde(skip_serializing, default)]
    credentials: McpCredentials,
    is_enabled: bool,
    needs_sync: bool,
    health: McpServerHealthSnapshot,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted server state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMcpServerData {
    /// Persisted server identifier.
    pub id: McpServerId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Persisted server name.
    pub name: McpServerName,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted transport settings.
    pub transport: McpTransport,
    /// Persisted credentials.
    pub credentials: McpCredentials,
    /// Whether the server is enabled.
    pub is_enabled: bool,
    /// Whether configuration changes await a sync.
    pub needs_sync: bool,
    /// Last recorded health.
    pub health: McpServerHealthSnapshot,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Partial update of an MCP server's configuration.
///
/// `None` leaves a field untouched. A blank description clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct McpServerUpdate {
    /// New server name.
    pub name: Option<McpServerName>,
    /// New description.
    pub description: Option<String>,
    /// New transport settings.
    pub transport: Option<McpTransport>,
    /// Replacement credentials.
    pub credentials: Option<McpCredentials>,
    /// New enabled flag.
    pub is_enabled: Option<bool>,
}

impl McpServer {
    /// Creates an enabled server that still needs its first sync.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        name: McpServerName,
        transport: McpTransport,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: McpServerId::new(),
            tenant_id,
            name,
            description: None,
            transport,
            credentials: McpCredentials::default(),
            is_enabled: true,
            needs_sync: true,
            health: McpServerHealthSnapshot::never_checked(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Sets the description. Blank descriptions are dropped.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = normalize_description(description);
        self
    }

    /// Sets the credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: McpCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the initial enabled flag.
    #[must_use]
    pub const fn with_enabled(mut self, is_enabled: bool) -> Self {
        self.is_enabled = is_enabled;
        self
    }

    /// Reconstructs a server from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedMcpServerData) -> Self {
        Self {
            id: data.id,
            tenant_id: data.tenant_id,
            name: data.name,
            description: data.description,
            transport: data.transport,
            credentials: data.credentials,
            is_enabled: data.is_enabled,
            needs_sync: data.needs_sync,
            health: data.health,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> McpServerId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the validated server name.
    #[must_use]
    pub const fn name(&self) -> &McpServerName {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the transport settings.
    #[must_use]
    pub const fn transport(&self) -> &McpTransport {
        &self.transport
    }

    /// Returns the stored credentials.
    #[must_use]
    pub const fn credentials(&self) -> &McpCredentials {
        &self.credentials
    }

    /// Returns whether the server is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Returns whether configuration changes await a sync.
    #[must_use]
    pub const fn needs_sync(&self) -> bool {
        self.needs_sync
    }

    /// Returns the last recorded health.
    #[must_use]
    pub const fn health(&self) -> &McpServerHealthSnapshot {
        &self.health
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest configuration update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a partial update and returns the kind of change it represents.
    ///
    /// An update that only flips the enabled flag is an `enable` or `disable`
    /// change; any other field change is an `update`. Returns `None`, leaving
    /// the server untouched, when nothing differs.
    pub fn apply_update(
        &mut self,
        update: McpServerUpdate,
        clock: &impl Clock,
    ) -> Option<ChangeKind> {
        let mut configuration_changed = false;

        if let Some(name) = update.name
            && name != self.name
        {
            self.name = name;
            configuration_changed = true;
        }
        if let Some(description) = update.description {
            let normalized = normalize_description(Some(description));
            if normalized != self.description {
                self.description = normalized;
                configuration_changed = true;
            }
        }
        if let Some(transport) = update.transport
            && transport != self.transport
        {
            self.transport = transport;
            configuration_changed = true;
        }
        if let Some(credentials) = update.credentials
            && credentials != self.credentials
        {
            self.credentials = credentials;
            configuration_changed = true;
        }

        let toggled = update
            .is_enabled
            .filter(|enabled| *enabled != self.is_enabled);
        if let Some(enabled) = toggled {
            self.is_enabled = enabled;
        }

        let kind = match (configuration_changed, toggled) {
            (true, _) => ChangeKind::Update,
            (false, Some(true)) => ChangeKind::Enable,
            (false, Some(false)) => ChangeKind::Disable,
            (false, None) => return None,
        };
        self.mark_needs_sync(clock);
        Some(kind)
    }

    /// Enables the server.
    pub fn enable(&mut self, clock: &impl Clock) {
        self.is_enabled = true;
        self.mark_needs_sync(clock);
    }

    /// Disables the server.
    pub fn disable(&mut self, clock: &impl Clock) {
        self.is_enabled = false;
        self.mark_needs_sync(clock);
    }

    /// Clears the sync flag after every queued change has been applied.
    pub const fn mark_synced(&mut self) {
        self.needs_sync = false;
    }

    /// Stores the outcome of a health probe.
    pub fn record_health(&mut self, snapshot: McpServerHealthSnapshot) {
        self.health = snapshot;
    }

    fn mark_needs_sync(&mut self, clock: &impl Clock) {
        self.needs_sync = true;
        self.updated_at = clock.utc();
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
