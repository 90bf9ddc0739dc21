//! Restart coordination: draining the change queue into the flow runtime.
//!
//! Sync runs are single-flight per tenant. A caller arriving while a run is
//! in progress joins it and receives the same [`SyncReport`]. Each run holds
//! the repository's sync lease, so runs in other processes sharing the store
//! wait their turn.
//!
//! Changes are applied oldest first. The runtime keys entries by server
//! name, so once a change fails every later change touching the same entity
//! or either of its names stays queued.

use crate::tenant::TenantId;
use crate::tool_registry::{
    domain::{FailedChange, PendingChange, RestartStatus, SyncReport},
    ports::{McpRuntime, McpServerRegistryError, McpServerRegistryRepository},
};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use mockable::Clock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Default upper bound for applying one change.
pub const DEFAULT_APPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors returned by the restart coordinator.
///
/// Failed changes are reported inside the [`SyncReport`]; only storage
/// failures surface here.
#[derive(Debug, Clone, Error)]
pub enum RestartCoordinatorError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] McpServerRegistryError),
}

/// Result type for restart coordinator operations.
pub type RestartCoordinatorResult<T> = Result<T, RestartCoordinatorError>;

type SharedSync = Shared<BoxFuture<'static, RestartCoordinatorResult<SyncReport>>>;

/// Applies queued changes to the runtime and reports restart status.
pub struct RestartCoordinator<R, M, C>
where
    R: McpServerRegistryRepository + ?Sized + 'static,
    M: McpRuntime + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    repository: Arc<R>,
    runtime: Arc<M>,
    clock: Arc<C>,
    apply_timeout: Duration,
    in_flight: Mutex<HashMap<TenantId, SharedSync>>,
}

impl<R, M, C> RestartCoordinator<R, M, C>
where
    R: McpServerRegistryRepository + ?Sized + 'static,
    M: McpRuntime + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a coordinator with the default apply timeout.
    #[must_use]
    pub fn new(repository: Arc<R>, runtime: Arc<M>, clock: Arc<C>) -> Self {
        Self {
            repository,
            runtime,
            clock,
            apply_timeout: DEFAULT_APPLY_TIMEOUT,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the per-change apply timeout.
    #[must_use]
    pub const fn with_apply_timeout(mut self, apply_timeout: Duration) -> Self {
        self.apply_timeout = apply_timeout;
        self
    }

    /// Returns the tenant's queued changes and last sync time.
    ///
    /// # Errors
    ///
    /// Returns [`RestartCoordinatorError::Repository`] when the queue cannot
    /// be read.
    pub async fn restart_status(
        &self,
        tenant_id: TenantId,
    ) -> RestartCoordinatorResult<RestartStatus> {
        let pending_changes = self.repository.pending_changes(tenant_id).await?;
        let last_sync_at = self.repository.last_sync_at(tenant_id).await?;
        Ok(RestartStatus {
            pending_changes,
            last_sync_at,
        })
    }

    /// Applies every queued change for the tenant.
    ///
    /// Concurrent calls for the same tenant share one run. Dropping the
    /// returned future leaves unapplied changes queued.
    ///
    /// # Errors
    ///
    /// Returns [`RestartCoordinatorError::Repository`] when the queue cannot
    /// be read or settled.
    pub async fn sync(&self, tenant_id: TenantId) -> RestartCoordinatorResult<SyncReport> {
        let run = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(existing) = in_flight.get(&tenant_id) {
                tracing::debug!(tenant_id = %tenant_id, "joining sync already in progress");
                existing.clone()
            } else {
                let run = drain_queue(
                    Arc::clone(&self.repository),
                    Arc::clone(&self.runtime),
                    Arc::clone(&self.clock),
                    self.apply_timeout,
                    tenant_id,
                )
                .boxed()
                .shared();
                in_flight.insert(tenant_id, run.clone());
                run
            }
        };

        let outcome = run.clone().await;

        let mut in_flight = self.in_flight.lock().await;
        if in_flight
            .get(&tenant_id)
            .is_some_and(|current| current.ptr_eq(&run))
        {
            in_flight.remove(&tenant_id);
        }
        outcome
    }
}

async fn drain_queue<R, M, C>(
    repository: Arc<R>,
    runtime: Arc<M>,
    clock: Arc<C>,
    apply_timeout: Duration,
    tenant_id: TenantId,
) -> RestartCoordinatorResult<SyncReport>
where
    R: McpServerRegistryRepository + ?Sized,
    M: McpRuntime + ?Sized,
    C: Clock + Send + Sync,
{
    let _lease = repository.acquire_sync_lease(tenant_id).await?;
    let queued = repository.pending_changes(tenant_id).await?;
    tracing::info!(tenant_id = %tenant_id, queued = queued.len(), "sync started");

    let mut applied = Vec::new();
    let mut failed = Vec::new();
    let mut blocked = BlockedTargets::default();

    for change in &queued {
        if blocked.touches(change) {
            blocked.extend(change);
            continue;
        }

        match apply_one(repository.as_ref(), runtime.as_ref(), apply_timeout, change).await? {
            Ok(()) => applied.push(change.id()),
            Err(reason) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    change_id = %change.id(),
                    entity = change.entity_name(),
                    kind = %change.kind(),
                    reason = %reason,
                    "change could not be applied"
                );
                blocked.extend(change);
                failed.push(FailedChange {
                    change_id: change.id(),
                    entity_name: change.entity_name().to_owned(),
                    kind: change.kind(),
                    reason,
                });
            }
        }
    }

    let status = repository
        .complete_changes(tenant_id, &applied, clock.utc())
        .await?;
    tracing::info!(
        tenant_id = %tenant_id,
        applied = applied.len(),
        failed = failed.len(),
        remaining = status.pending_changes.len(),
        "sync finished"
    );

    Ok(SyncReport {
        applied,
        failed,
        pending_changes: status.pending_changes,
        last_sync_at: status.last_sync_at,
    })
}

/// Entities and runtime entry names held back after a failure.
#[derive(Debug, Default)]
struct BlockedTargets {
    entities: HashSet<Uuid>,
    names: HashSet<String>,
}

impl BlockedTargets {
    fn touches(&self, change: &PendingChange) -> bool {
        self.entities.contains(&change.entity_id())
            || runtime_names(change).any(|name| self.names.contains(name))
    }

    fn extend(&mut self, change: &PendingChange) {
        self.entities.insert(change.entity_id());
        self.names.extend(runtime_names(change).map(str::to_owned));
    }
}

fn runtime_names(change: &PendingChange) -> impl Iterator<Item = &str> {
    std::iter::once(change.entity_name()).chain(change.previous_name())
}

fn describe_timeout(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

async fn apply_one<R, M>(
    repository: &R,
    runtime: &M,
    apply_timeout: Duration,
    change: &PendingChange,
) -> RestartCoordinatorResult<Result<(), String>>
where
    R: McpServerRegistryRepository + ?Sized,
    M: McpRuntime + ?Sized,
{
    let current = match change.server_id() {
        Some(server_id) => repository
            .find_by_id(server_id)
            .await?
            .filter(|server| server.tenant_id() == change.tenant_id()),
        None => None,
    };

    let applying = runtime.apply(change, current.as_ref());
    let outcome = match tokio::time::timeout(apply_timeout, applying).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err(format!(
            "runtime did not respond within {}",
            describe_timeout(apply_timeout)
        )),
    };
    Ok(outcome)
}
