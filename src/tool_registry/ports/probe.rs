//! Port for reachability checks against configured MCP servers.

use crate::tool_registry::domain::{McpServer, McpServerHealthSnapshot};
use async_trait::async_trait;

/// Reachability probe for one MCP server.
///
/// Probes report failure inside the returned snapshot; they never error.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probes `server` and returns the observed health.
    async fn probe(&self, server: &McpServer) -> McpServerHealthSnapshot;
}
