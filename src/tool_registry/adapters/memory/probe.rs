//! Scripted health probe.

use crate::tool_registry::{
    domain::{McpServer, McpServerHealthSnapshot, McpServerHealthStatus, McpServerName},
    ports::HealthProbe,
};
use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Probe that reports scripted outcomes; unscripted servers are healthy.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHealthProbe {
    outcomes: Arc<RwLock<HashMap<McpServerName, McpServerHealthStatus>>>,
}

impl InMemoryHealthProbe {
    /// Creates a probe that reports every server as healthy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status reported for `server_name`.
    pub fn script(&self, server_name: &McpServerName, status: McpServerHealthStatus) {
        if let Ok(mut outcomes) = self.outcomes.write() {
            outcomes.insert(server_name.clone(), status);
        }
    }
}

#[async_trait]
impl HealthProbe for InMemoryHealthProbe {
    async fn probe(&self, server: &McpServer) -> McpServerHealthSnapshot {
        let status = self
            .outcomes
            .read()
            .ok()
            .and_then(|outcomes| outcomes.get(server.name()).copied())
            .unwrap_or(McpServerHealthStatus::Healthy);
        let checked_at = DefaultClock.utc();
        match status {
            McpServerHealthStatus::Unhealthy => {
                McpServerHealthSnapshot::unhealthy(checked_at, "scripted failure")
            }
            other => McpServerHealthSnapshot::observed(other, checked_at),
        }
    }
}
