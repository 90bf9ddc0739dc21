//! In-memory repository for MCP servers and their change queue.

use crate::tenant::TenantId;
use crate::tool_registry::{
    domain::{
        McpServer, McpServerHealthSnapshot, McpServerId, McpServerName, PendingChange,
        PendingChangeId, RestartStatus,
    },
    ports::{
        McpServerRegistryError, McpServerRegistryRepository, McpServerRegistryResult, SyncLease,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory MCP server registry repository.
///
/// Server writes and change appends happen under one write lock. Clones
/// share state, including the per-tenant sync leases.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMcpServerRegistry {
    state: Arc<RwLock<InMemoryRegistryState>>,
    sync_locks: Arc<Mutex<HashMap<TenantId, Arc<tokio::sync::Mutex<()>>>>>,
}

#[derive(Debug, Default)]
struct InMemoryRegistryState {
    servers: HashMap<McpServerId, McpServer>,
    name_index: HashMap<(TenantId, McpServerName), McpServerId>,
    changes: Vec<PendingChange>,
    last_sync: HashMap<TenantId, DateTime<Utc>>,
}

impl InMemoryRegistryState {
    fn queued_for(&self, tenant_id: TenantId) -> Vec<PendingChange> {
        self.changes
            .iter()
            .filter(|change| change.tenant_id() == tenant_id)
            .cloned()
            .collect()
    }
}

impl InMemoryMcpServerRegistry {
    /// Creates an empty in-memory registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> McpServerRegistryResult<RwLockReadGuard<'_, InMemoryRegistryState>> {
        self.state.read().map_err(|err| {
            McpServerRegistryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> McpServerRegistryResult<RwLockWriteGuard<'_, InMemoryRegistryState>> {
        self.state.write().map_err(|err| {
            McpServerRegistryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl McpServerRegistryRepository for InMemoryMcpServerRegistry {
    async fn register(
        &self,
        server: &McpServer,
        change: &PendingChange,
    ) -> McpServerRegistryResult<()> {
        let mut state = self.write()?;

        if state.servers.contains_key(&server.id()) {
            return Err(McpServerRegistryError::DuplicateServer(server.id()));
        }

        let name_key = (server.tenant_id(), server.name().clone());
        if state.name_index.contains_key(&name_key) {
            return Err(McpServerRegistryError::DuplicateServerName(
                server.name().clone(),
            ));
        }

        state.name_index.insert(name_key, server.id());
        state.servers.insert(server.id(), server.clone());
        state.changes.push(change.clone());
        Ok(())
    }

    async fn update(
        &self,
        server: &McpServer,
        change: &PendingChange,
    ) -> McpServerRegistryResult<()> {
        let mut state = self.write()?;

        let stored = state
            .servers
            .get(&server.id())
            .ok_or(McpServerRegistryError::NotFound(server.id()))?;
        let stored_name = stored.name().clone();
        let stored_health = stored.health().clone();

        if *server.name() != stored_name {
            let new_key = (server.tenant_id(), server.name().clone());
            if let Some(&indexed_id) = state.name_index.get(&new_key)
                && indexed_id != server.id()
            {
                return Err(McpServerRegistryError::DuplicateServerName(
                    server.name().clone(),
                ));
            }

            state
                .name_index
                .remove(&(server.tenant_id(), stored_name));
            state.name_index.insert(new_key, server.id());
        }

        let mut updated = server.clone();
        updated.record_health(stored_health);
        state.servers.insert(server.id(), updated);
        state.changes.push(change.clone());
        Ok(())
    }

    async fn delete(
        &self,
        server_id: McpServerId,
        change: &PendingChange,
    ) -> McpServerRegistryResult<()> {
        let mut state = self.write()?;

        let removed = state
            .servers
            .remove(&server_id)
            .ok_or(McpServerRegistryError::NotFound(server_id))?;
        state
            .name_index
            .remove(&(removed.tenant_id(), removed.name().clone()));
        state.changes.push(change.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        server_id: McpServerId,
    ) -> McpServerRegistryResult<Option<McpServer>> {
        Ok(self.read()?.servers.get(&server_id).cloned())
    }

    async fn find_by_name(
        &self,
        tenant_id: TenantId,
        server_name: &McpServerName,
    ) -> McpServerRegistryResult<Option<McpServer>> {
        let state = self.read()?;
        Ok(state
            .name_index
            .get(&(tenant_id, server_name.clone()))
            .and_then(|server_id| state.servers.get(server_id))
            .cloned())
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> McpServerRegistryResult<Vec<McpServer>> {
        let state = self.read()?;
        let mut servers: Vec<McpServer> = state
            .servers
            .values()
            .filter(|server| server.tenant_id() == tenant_id)
            .cloned()
            .collect();
        servers.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(servers)
    }

    async fn list_enabled(&self) -> McpServerRegistryResult<Vec<McpServer>> {
        let state = self.read()?;
        let mut servers: Vec<McpServer> = state
            .servers
            .values()
            .filter(|server| server.is_enabled())
            .cloned()
            .collect();
        servers.sort_by_key(McpServer::created_at);
        Ok(servers)
    }

    async fn record_health(
        &self,
        server_id: McpServerId,
        snapshot: &McpServerHealthSnapshot,
    ) -> McpServerRegistryResult<()> {
        let mut state = self.write()?;
        let server = state
            .servers
            .get_mut(&server_id)
            .ok_or(McpServerRegistryError::NotFound(server_id))?;
        server.record_health(snapshot.clone());
        Ok(())
    }

    async fn pending_changes(
        &self,
        tenant_id: TenantId,
    ) -> McpServerRegistryResult<Vec<PendingChange>> {
        Ok(self.read()?.queued_for(tenant_id))
    }

    async fn complete_changes(
        &self,
        tenant_id: TenantId,
        applied: &[PendingChangeId],
        synced_at: DateTime<Utc>,
    ) -> McpServerRegistryResult<RestartStatus> {
        let mut state = self.write()?;
        let applied: HashSet<PendingChangeId> = applied.iter().copied().collect();

        state
            .changes
            .retain(|change| change.tenant_id() != tenant_id || !applied.contains(&change.id()));

        let remaining = state.queued_for(tenant_id);
        let still_queued: HashSet<McpServerId> =
            remaining.iter().filter_map(PendingChange::server_id).collect();
        for server in state.servers.values_mut() {
            if server.tenant_id() == tenant_id && !still_queued.contains(&server.id()) {
                server.mark_synced();
            }
        }

        if remaining.is_empty() {
            state.last_sync.insert(tenant_id, synced_at);
        }

        Ok(RestartStatus {
            pending_changes: remaining,
            last_sync_at: state.last_sync.get(&tenant_id).copied(),
        })
    }

    async fn last_sync_at(
        &self,
        tenant_id: TenantId,
    ) -> McpServerRegistryResult<Option<DateTime<Utc>>> {
        Ok(self.read()?.last_sync.get(&tenant_id).copied())
    }

    async fn acquire_sync_lease(&self, tenant_id: TenantId) -> McpServerRegistryResult<SyncLease> {
        let lock = {
            let mut locks = self.sync_locks.lock().map_err(|err| {
                McpServerRegistryError::persistence(std::io::Error::other(err.to_string()))
            })?;
            Arc::clone(locks.entry(tenant_id).or_default())
        };
        let guard = lock.lock_owned().await;
        Ok(SyncLease::new(tenant_id, guard))
    }
}
