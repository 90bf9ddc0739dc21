//! Shared in-memory application stack for integration tests.
//!
//! Every adapter is in memory; the services are assembled exactly as the
//! server assembles them.

use std::sync::Arc;

use rstest::fixture;
use switchboard::bridge::{
    adapters::memory::{InMemoryBridgeTokenRepository, InMemoryFlowExecutor},
    ports::FlowExecutor,
};
use switchboard::http::{Adapters, AppState, ServiceTimeouts};
use switchboard::publication::{
    adapters::memory::InMemoryAgentComponentRepository, domain::AgentComponent,
    services::CreateAgentComponentRequest,
};
use switchboard::skill::{
    adapters::memory::InMemoryWorkflowRepository, domain::Workflow,
    services::CreateWorkflowRequest,
};
use switchboard::tenant::{TenantId, UserProfile, adapters::InMemoryIdentityResolver};
use switchboard::tool_registry::adapters::memory::{
    InMemoryHealthProbe, InMemoryMcpRuntime, InMemoryMcpServerRegistry,
};

/// Identity token registered for [`Stack::tenant`].
pub const IDENTITY: &str = "identity-alice";

/// Identity token registered for [`Stack::other_tenant`].
pub const OTHER_IDENTITY: &str = "identity-bob";

/// Every in-memory adapter plus the services built on top of them.
pub struct Stack {
    pub tenant: TenantId,
    pub other_tenant: TenantId,
    pub runtime: Arc<InMemoryMcpRuntime>,
    pub probe: Arc<InMemoryHealthProbe>,
    pub executor: Arc<InMemoryFlowExecutor>,
    pub state: AppState,
}

impl Stack {
    pub fn new() -> Self {
        Self::with_timeouts(ServiceTimeouts::default())
    }

    pub fn with_timeouts(timeouts: ServiceTimeouts) -> Self {
        Self::build(timeouts, None)
    }

    /// Routes tool calls to `executor` instead of the in-memory echo.
    pub fn with_executor(executor: Arc<dyn FlowExecutor>) -> Self {
        Self::build(ServiceTimeouts::default(), Some(executor))
    }

    fn build(timeouts: ServiceTimeouts, custom_executor: Option<Arc<dyn FlowExecutor>>) -> Self {
        let tenant = TenantId::new();
        let other_tenant = TenantId::new();
        let identities = Arc::new(InMemoryIdentityResolver::new());
        identities
            .register(
                IDENTITY,
                UserProfile::new(tenant, "alice@example.com").with_names("Alice", "Example"),
            )
            .expect("register identity");
        identities
            .register(OTHER_IDENTITY, UserProfile::new(other_tenant, "bob@example.com"))
            .expect("register identity");

        let runtime = Arc::new(InMemoryMcpRuntime::new());
        let probe = Arc::new(InMemoryHealthProbe::new());
        let executor = Arc::new(InMemoryFlowExecutor::new());
        let adapters = Adapters {
            identities,
            agents: Arc::new(InMemoryAgentComponentRepository::new()),
            workflows: Arc::new(InMemoryWorkflowRepository::new()),
            mcp_servers: Arc::new(InMemoryMcpServerRegistry::new()),
            runtime: runtime.clone(),
            probe: probe.clone(),
            tokens: Arc::new(InMemoryBridgeTokenRepository::new()),
            executor: custom_executor.unwrap_or_else(|| executor.clone() as Arc<dyn FlowExecutor>),
        };

        Self {
            tenant,
            other_tenant,
            runtime,
            probe,
            executor,
            state: AppState::new(adapters, timeouts),
        }
    }

    pub async fn agent(&self, name: &str) -> AgentComponent {
        self.state
            .publication
            .create(self.tenant, CreateAgentComponentRequest::new(name))
            .await
            .expect("create agent component")
    }

    pub async fn skill(&self, name: &str) -> Workflow {
        let workflow = self
            .state
            .skills
            .create(self.tenant, CreateWorkflowRequest::new(name))
            .await
            .expect("create workflow");
        self.state
            .skills
            .set_skill(self.tenant, workflow.id(), true)
            .await
            .expect("expose workflow as skill")
    }

    pub async fn bridge_token(&self) -> String {
        let bootstrap = self
            .state
            .bridge
            .bootstrap(IDENTITY)
            .await
            .expect("bootstrap bridge");
        bootstrap.token.value().expose().to_owned()
    }
}

#[fixture]
pub fn stack() -> Stack {
    Stack::new()
}
