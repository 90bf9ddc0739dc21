//! Background health monitoring for enabled MCP servers.

use crate::tenant::TenantId;
use crate::tool_registry::{
    domain::{McpServer, McpServerHealthSnapshot, McpServerHealthStatus, McpServerId},
    ports::{HealthProbe, McpServerRegistryError, McpServerRegistryRepository},
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Errors returned by on-demand health checks.
#[derive(Debug, Error)]
pub enum HealthMonitorError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] McpServerRegistryError),
    /// No server with the given identifier exists for the tenant.
    #[error("MCP server {0} not found")]
    NotFound(McpServerId),
}

/// Result type for health monitor operations.
pub type HealthMonitorResult<T> = Result<T, HealthMonitorError>;

/// Probes enabled servers and records what it observes.
///
/// Only health columns are written. A failing probe never disables a server,
/// marks it as needing a sync, or queues a change.
pub struct HealthMonitor<R, P>
where
    R: McpServerRegistryRepository + ?Sized,
    P: HealthProbe + ?Sized,
{
    repository: Arc<R>,
    probe: Arc<P>,
}

impl<R, P> HealthMonitor<R, P>
where
    R: McpServerRegistryRepository + ?Sized + 'static,
    P: HealthProbe + ?Sized + 'static,
{
    /// Creates a health monitor.
    #[must_use]
    pub const fn new(repository: Arc<R>, probe: Arc<P>) -> Self {
        Self { repository, probe }
    }

    /// Probes every enabled server once and returns how many were probed.
    ///
    /// # Errors
    ///
    /// Returns [`HealthMonitorError::Repository`] when enabled servers cannot
    /// be listed. Failures recording an individual result are logged.
    pub async fn probe_all(&self) -> HealthMonitorResult<usize> {
        let servers = self.repository.list_enabled().await?;
        let probes = servers.iter().map(|server| self.probe_and_record(server));
        let outcomes = futures_util::future::join_all(probes).await;

        for (server, outcome) in servers.iter().zip(outcomes) {
            match outcome {
                Ok(_) | Err(McpServerRegistryError::NotFound(_)) => {}
                Err(err) => tracing::warn!(
                    server_id = %server.id(),
                    err = %err,
                    "failed to record MCP server health"
                ),
            }
        }
        Ok(servers.len())
    }

    /// Probes one server now, regardless of its enabled flag.
    ///
    /// # Errors
    ///
    /// Returns [`HealthMonitorError::NotFound`] when the server does not
    /// exist for the tenant.
    pub async fn check(
        &self,
        tenant_id: TenantId,
        server_id: McpServerId,
    ) -> HealthMonitorResult<McpServer> {
        let mut server = self
            .repository
            .find_by_id(server_id)
            .await?
            .filter(|server| server.tenant_id() == tenant_id)
            .ok_or(HealthMonitorError::NotFound(server_id))?;

        let snapshot = self
            .probe_and_record(&server)
            .await
            .map_err(|err| match err {
                McpServerRegistryError::NotFound(_) => HealthMonitorError::NotFound(server_id),
                other => other.into(),
            })?;
        server.record_health(snapshot);
        Ok(server)
    }

    /// Probes a server that has not been saved. Nothing is recorded.
    pub async fn test_connection(&self, draft: &McpServer) -> McpServerHealthSnapshot {
        let snapshot = self.probe.probe(draft).await;
        tracing::info!(
            tenant_id = %draft.tenant_id(),
            transport = %draft.transport().kind(),
            status = %snapshot.status(),
            "connection test finished"
        );
        snapshot
    }

    async fn probe_and_record(
        &self,
        server: &McpServer,
    ) -> Result<McpServerHealthSnapshot, McpServerRegistryError> {
        let snapshot = self.probe.probe(server).await;
        let previous = server.health().status();
        if previous != snapshot.status() {
            log_transition(server, previous, snapshot.status(), snapshot.message());
        }
        self.repository
            .record_health(server.id(), &snapshot)
            .await?;
        Ok(snapshot)
    }

    /// Spawns the periodic probe loop.
    ///
    /// Missed ticks are skipped. The loop exits when `shutdown` is cancelled.
    pub fn spawn(
        self: Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = timer.tick() => {}
                }

                if let Err(err) = self.probe_all().await {
                    tracing::warn!(err = %err, "health sweep failed");
                }
            }
            tracing::debug!("health monitor stopped");
        })
    }
}

fn log_transition(
    server: &McpServer,
    previous: McpServerHealthStatus,
    current: McpServerHealthStatus,
    message: Option<&str>,
) {
    match current {
        McpServerHealthStatus::Unhealthy => tracing::warn!(
            tenant_id = %server.tenant_id(),
            server = %server.name(),
            from = %previous,
            detail = message.unwrap_or_default(),
            "MCP server became unhealthy"
        ),
        _ => tracing::info!(
            tenant_id = %server.tenant_id(),
            server = %server.name(),
            from = %previous,
            to = %current,
            "MCP server health changed"
        ),
    }
}
