//! Repository port for MCP server configuration and the change queue.

use crate::tenant::TenantId;
use crate::tool_registry::domain::{
    McpServer, McpServerHealthSnapshot, McpServerId, McpServerName, PendingChange,
    PendingChangeId, RestartStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for MCP server registry operations.
pub type McpServerRegistryResult<T> = Result<T, McpServerRegistryError>;

/// Persistence contract for MCP servers and their pending changes.
///
/// Every configuration write takes the [`PendingChange`] describing it and
/// commits both atomically.
#[async_trait]
pub trait McpServerRegistryRepository: Send + Sync {
    /// Stores a new server and queues its `create` change.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryError::DuplicateServer`] when the ID already
    /// exists or [`McpServerRegistryError::DuplicateServerName`] when the
    /// tenant already uses the name.
    async fn register(
        &self,
        server: &McpServer,
        change: &PendingChange,
    ) -> McpServerRegistryResult<()>;

    /// Persists configuration changes and queues the matching change.
    ///
    /// Health columns are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryError::NotFound`] when the server does not
    /// exist or [`McpServerRegistryError::DuplicateServerName`] on a rename
    /// collision.
    async fn update(
        &self,
        server: &McpServer,
        change: &PendingChange,
    ) -> McpServerRegistryResult<()>;

    /// Removes a server and queues its `delete` change.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryError::NotFound`] when the server does not
    /// exist.
    async fn delete(
        &self,
        server_id: McpServerId,
        change: &PendingChange,
    ) -> McpServerRegistryResult<()>;

    /// Finds a server by identifier.
    async fn find_by_id(&self, server_id: McpServerId)
    -> McpServerRegistryResult<Option<McpServer>>;

    /// Finds a tenant's server by name.
    async fn find_by_name(
        &self,
        tenant_id: TenantId,
        server_name: &McpServerName,
    ) -> McpServerRegistryResult<Option<McpServer>>;

    /// Returns a tenant's servers ordered by name.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> McpServerRegistryResult<Vec<McpServer>>;

    /// Returns enabled servers across all tenants.
    async fn list_enabled(&self) -> McpServerRegistryResult<Vec<McpServer>>;

    /// Stores a health snapshot without touching configuration or sync state.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryError::NotFound`] when the server was
    /// removed in the meantime.
    async fn record_health(
        &self,
        server_id: McpServerId,
        snapshot: &McpServerHealthSnapshot,
    ) -> McpServerRegistryResult<()>;

    /// Returns a tenant's queued changes, oldest first.
    async fn pending_changes(&self, tenant_id: TenantId)
    -> McpServerRegistryResult<Vec<PendingChange>>;

    /// Removes applied changes and settles sync state in one step.
    ///
    /// Servers left without queued changes have `needs_sync` cleared. When
    /// the queue ends up empty `synced_at` becomes the tenant's last sync
    /// time. Identifiers that are no longer queued are ignored.
    async fn complete_changes(
        &self,
        tenant_id: TenantId,
        applied: &[PendingChangeId],
        synced_at: DateTime<Utc>,
    ) -> McpServerRegistryResult<RestartStatus>;

    /// Returns when a sync last emptied the tenant's queue.
    async fn last_sync_at(&self, tenant_id: TenantId)
    -> McpServerRegistryResult<Option<DateTime<Utc>>>;

    /// Waits for exclusive use of the tenant's queue.
    ///
    /// The lease is shared by every process using the same store and is
    /// released when dropped.
    async fn acquire_sync_lease(&self, tenant_id: TenantId) -> McpServerRegistryResult<SyncLease>;
}

/// Exclusive right to drain one tenant's change queue.
pub struct SyncLease {
    tenant_id: TenantId,
    _guard: Box<dyn Send>,
}

impl SyncLease {
    /// Wraps the adapter-specific guard that holds the lock.
    #[must_use]
    pub fn new(tenant_id: TenantId, guard: impl Send + 'static) -> Self {
        Self {
            tenant_id,
            _guard: Box::new(guard),
        }
    }

    /// Returns the tenant whose queue is held.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

impl fmt::Debug for SyncLease {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncLease")
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

/// Errors returned by MCP server registry repository implementations.
#[derive(Debug, Clone, Error)]
pub enum McpServerRegistryError {
    /// A server with the same identifier already exists.
    #[error("duplicate MCP server identifier: {0}")]
    DuplicateServer(McpServerId),

    /// A server with the same name already exists for the tenant.
    #[error("duplicate MCP server name: {0}")]
    DuplicateServerName(McpServerName),

    /// The server was not found.
    #[error("MCP server not found: {0}")]
    NotFound(McpServerId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted MCP server data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl McpServerRegistryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
