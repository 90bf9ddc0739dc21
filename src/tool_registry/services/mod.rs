//! Application services for MCP server configuration, sync and health.

mod health;
mod registry;
mod sync;

pub use health::{HealthMonitor, HealthMonitorError, HealthMonitorResult};
pub use registry::{
    CONNECTION_TEST_NAME, CreateFromTemplateRequest, CreateMcpServerRequest, McpServerRegistryService,
    McpServerRegistryServiceError, McpServerRegistryServiceResult, UpdateMcpServerRequest,
};
pub use sync::{
    DEFAULT_APPLY_TIMEOUT, RestartCoordinator, RestartCoordinatorError, RestartCoordinatorResult,
};
