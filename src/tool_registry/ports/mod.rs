//! Port contracts for MCP server configuration, sync and health.

mod probe;
mod repository;
mod runtime;

pub use probe::HealthProbe;
pub use repository::{
    McpServerRegistryError, McpServerRegistryRepository, McpServerRegistryResult, SyncLease,
};
pub use runtime::{McpRuntime, McpRuntimeError, McpRuntimeResult};
