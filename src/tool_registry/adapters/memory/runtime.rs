//! In-memory flow runtime used by tests and local runs.

use crate::tenant::TenantId;
use crate::tool_registry::{
    domain::{ChangeKind, McpServer, PendingChange, PendingChangeId},
    ports::{McpRuntime, McpRuntimeError, McpRuntimeResult},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Runtime double that keeps the live configuration in memory.
///
/// Failures can be injected per server name to exercise partial syncs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMcpRuntime {
    state: Arc<RwLock<RuntimeState>>,
}

#[derive(Debug, Default)]
struct RuntimeState {
    applied: Vec<PendingChangeId>,
    live: HashMap<TenantId, BTreeMap<String, bool>>,
    failing: HashSet<String>,
}

impl InMemoryMcpRuntime {
    /// Creates a runtime with no live servers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every change for `server_name` fail until [`Self::recover`].
    pub fn fail_for(&self, server_name: &str) {
        if let Ok(mut state) = self.state.write() {
            state.failing.insert(server_name.to_owned());
        }
    }

    /// Stops injecting failures for `server_name`.
    pub fn recover(&self, server_name: &str) {
        if let Ok(mut state) = self.state.write() {
            state.failing.remove(server_name);
        }
    }

    /// Returns applied change identifiers in application order.
    #[must_use]
    pub fn applied(&self) -> Vec<PendingChangeId> {
        self.state
            .read()
            .map(|state| state.applied.clone())
            .unwrap_or_default()
    }

    /// Returns the tenant's live servers mapped to their enabled flag.
    #[must_use]
    pub fn live_servers(&self, tenant_id: TenantId) -> BTreeMap<String, bool> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.live.get(&tenant_id).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl McpRuntime for InMemoryMcpRuntime {
    async fn apply(
        &self,
        change: &PendingChange,
        current: Option<&McpServer>,
    ) -> McpRuntimeResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| McpRuntimeError::unavailable(std::io::Error::other(err.to_string())))?;

        if state.failing.contains(change.entity_name()) {
            return Err(McpRuntimeError::Rejected(format!(
                "server '{}' is unavailable",
                change.entity_name()
            )));
        }

        let live = state.live.entry(change.tenant_id()).or_default();
        if let Some(previous_name) = change.previous_name() {
            live.remove(previous_name);
        }
        match (change.kind(), current) {
            (ChangeKind::Delete, _) | (_, None) => {
                live.remove(change.entity_name());
            }
            (_, Some(server)) => {
                live.insert(server.name().as_str().to_owned(), server.is_enabled());
            }
        }
        state.applied.push(change.id());
        Ok(())
    }
}
