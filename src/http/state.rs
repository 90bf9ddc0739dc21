//! Shared application state handed to every handler.

use crate::bridge::{
    ports::{BridgeTokenRepository, FlowExecutor},
    services::BridgeSessionService,
};
use crate::publication::{ports::AgentComponentRepository, services::PublicationService};
use crate::skill::{ports::WorkflowRepository, services::SkillRegistryService};
use crate::tenant::ports::IdentityResolver;
use crate::tool_registry::{
    ports::{HealthProbe, McpRuntime, McpServerRegistryRepository},
    services::{HealthMonitor, McpServerRegistryService, RestartCoordinator},
};
use mockable::DefaultClock;
use std::sync::Arc;

/// Publication service over type-erased adapters.
pub type DynPublicationService = PublicationService<dyn AgentComponentRepository, DefaultClock>;

/// Skill registry service over type-erased adapters.
pub type DynSkillRegistryService = SkillRegistryService<dyn WorkflowRepository, DefaultClock>;

/// MCP server registry service over type-erased adapters.
pub type DynMcpServerRegistryService =
    McpServerRegistryService<dyn McpServerRegistryRepository, DefaultClock>;

/// Restart coordinator over type-erased adapters.
pub type DynRestartCoordinator =
    RestartCoordinator<dyn McpServerRegistryRepository, dyn McpRuntime, DefaultClock>;

/// Health monitor over type-erased adapters.
pub type DynHealthMonitor = HealthMonitor<dyn McpServerRegistryRepository, dyn HealthProbe>;

/// Bridge session service over type-erased adapters.
pub type DynBridgeSessionService = BridgeSessionService<
    dyn IdentityResolver,
    dyn BridgeTokenRepository,
    dyn AgentComponentRepository,
    dyn WorkflowRepository,
    dyn FlowExecutor,
    DefaultClock,
>;

/// Services reachable from HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Resolves management callers to tenants.
    pub identities: Arc<dyn IdentityResolver>,
    /// Agent component publication.
    pub publication: Arc<DynPublicationService>,
    /// Workflow skill exposure.
    pub skills: Arc<DynSkillRegistryService>,
    /// MCP server configuration.
    pub mcp_servers: Arc<DynMcpServerRegistryService>,
    /// Pending change application.
    pub restart: Arc<DynRestartCoordinator>,
    /// Health probing.
    pub health: Arc<DynHealthMonitor>,
    /// Bridge sessions.
    pub bridge: Arc<DynBridgeSessionService>,
}

/// Adapter set from which [`AppState`] is assembled.
#[derive(Clone)]
pub struct Adapters {
    /// Identity resolver.
    pub identities: Arc<dyn IdentityResolver>,
    /// Agent component storage.
    pub agents: Arc<dyn AgentComponentRepository>,
    /// Workflow storage.
    pub workflows: Arc<dyn WorkflowRepository>,
    /// MCP server and change-queue storage.
    pub mcp_servers: Arc<dyn McpServerRegistryRepository>,
    /// Flow runtime configuration sink.
    pub runtime: Arc<dyn McpRuntime>,
    /// Health probe.
    pub probe: Arc<dyn HealthProbe>,
    /// Bridge token storage.
    pub tokens: Arc<dyn BridgeTokenRepository>,
    /// Tool-call executor.
    pub executor: Arc<dyn FlowExecutor>,
}

/// Timeouts applied by the services.
#[derive(Debug, Clone, Copy)]
pub struct ServiceTimeouts {
    /// Upper bound for applying one pending change.
    pub sync_apply: std::time::Duration,
    /// Upper bound for one bridge tool call.
    pub tool_call: std::time::Duration,
}

impl Default for ServiceTimeouts {
    fn default() -> Self {
        Self {
            sync_apply: crate::tool_registry::services::DEFAULT_APPLY_TIMEOUT,
            tool_call: crate::bridge::services::DEFAULT_TOOL_CALL_TIMEOUT,
        }
    }
}

impl AppState {
    /// Builds every service on top of `adapters`.
    #[must_use]
    pub fn new(adapters: Adapters, timeouts: ServiceTimeouts) -> Self {
        let clock = Arc::new(DefaultClock);
        let Adapters {
            identities,
            agents,
            workflows,
            mcp_servers,
            runtime,
            probe,
            tokens,
            executor,
        } = adapters;

        Self {
            publication: Arc::new(PublicationService::new(
                Arc::clone(&agents),
                Arc::clone(&clock),
            )),
            skills: Arc::new(SkillRegistryService::new(
                Arc::clone(&workflows),
                Arc::clone(&clock),
            )),
            mcp_servers: Arc::new(McpServerRegistryService::new(
                Arc::clone(&mcp_servers),
                Arc::clone(&clock),
            )),
            restart: Arc::new(
                RestartCoordinator::new(Arc::clone(&mcp_servers), runtime, Arc::clone(&clock))
                    .with_apply_timeout(timeouts.sync_apply),
            ),
            health: Arc::new(HealthMonitor::new(mcp_servers, probe)),
            bridge: Arc::new(
                BridgeSessionService::new(
                    Arc::clone(&identities),
                    tokens,
                    agents,
                    workflows,
                    executor,
                    clock,
                )
                .with_call_timeout(timeouts.tool_call),
            ),
            identities,
        }
    }
}
