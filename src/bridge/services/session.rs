//! Bridge session service: token issue, validation and live tool resolution.
//!
//! Nothing about the live agent or the skill set is captured when a token is
//! issued. Every bridge call re-reads the publication and skill registries,
//! so a publish or skill toggle is visible to the very next call made with an
//! existing token.

use crate::bridge::{
    domain::{BridgeTool, BridgeToken, BridgeTokenValue, ToolCallResult, tools_for_skills},
    ports::{
        BridgeTokenRepository, BridgeTokenRepositoryError, FlowExecutor, FlowExecutorError,
    },
};
use crate::publication::{
    domain::AgentComponent,
    ports::{AgentComponentRepository, AgentComponentRepositoryError},
};
use crate::skill::{
    domain::{Workflow, WorkflowId},
    ports::{WorkflowRepository, WorkflowRepositoryError},
};
use crate::tenant::{
    TenantId, UserProfile,
    ports::{IdentityError, IdentityResolver},
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default upper bound for one tool call.
pub const DEFAULT_TOOL_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Service-level errors for bridge sessions.
#[derive(Debug, Error)]
pub enum BridgeSessionError {
    /// The identity or bridge token is unknown or revoked.
    #[error("invalid authentication: provide a valid bridge token")]
    Unauthorized,
    /// No live tool matches the requested name.
    #[error("tool '{0}' not found")]
    ToolNotFound(String),
    /// The identity provider failed.
    #[error(transparent)]
    Identity(IdentityError),
    /// Token storage failed.
    #[error(transparent)]
    Tokens(#[from] BridgeTokenRepositoryError),
    /// Agent component storage failed.
    #[error(transparent)]
    Agents(#[from] AgentComponentRepositoryError),
    /// Workflow storage failed.
    #[error(transparent)]
    Workflows(#[from] WorkflowRepositoryError),
}

impl From<IdentityError> for BridgeSessionError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unauthorized => Self::Unauthorized,
            other @ IdentityError::Provider(_) => Self::Identity(other),
        }
    }
}

/// Result type for bridge session operations.
pub type BridgeSessionResult<T> = Result<T, BridgeSessionError>;

/// Everything a desktop bridge needs on start-up.
#[derive(Debug, Clone)]
pub struct BridgeBootstrap {
    /// Caller's profile.
    pub user: UserProfile,
    /// Currently published agent, if any.
    pub published_agent: Option<AgentComponent>,
    /// Active skill workflows.
    pub skills: Vec<Workflow>,
    /// The tenant's active bridge token.
    pub token: BridgeToken,
}

/// A tool invocation from a bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Tool name as listed by [`BridgeSessionService::list_tools`].
    pub name: String,
    /// Tool arguments; `message` is the chat input.
    pub arguments: Value,
    /// Explicit workflow, overriding name matching.
    pub workflow_id: Option<WorkflowId>,
}

impl ToolCall {
    /// Creates a call that sends `message` to the named tool.
    #[must_use]
    pub fn message(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: serde_json::json!({ "message": message.into() }),
            workflow_id: None,
        }
    }
}

/// Bridge session service.
pub struct BridgeSessionService<I, T, A, W, E, C>
where
    I: IdentityResolver + ?Sized,
    T: BridgeTokenRepository + ?Sized,
    A: AgentComponentRepository + ?Sized,
    W: WorkflowRepository + ?Sized,
    E: FlowExecutor + ?Sized,
    C: Clock + Send + Sync,
{
    identities: Arc<I>,
    tokens: Arc<T>,
    agents: Arc<A>,
    workflows: Arc<W>,
    executor: Arc<E>,
    clock: Arc<C>,
    call_timeout: Duration,
}

impl<I, T, A, W, E, C> BridgeSessionService<I, T, A, W, E, C>
where
    I: IdentityResolver + ?Sized,
    T: BridgeTokenRepository + ?Sized,
    A: AgentComponentRepository + ?Sized,
    W: WorkflowRepository + ?Sized,
    E: FlowExecutor + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default tool-call timeout.
    #[must_use]
    pub const fn new(
        identities: Arc<I>,
        tokens: Arc<T>,
        agents: Arc<A>,
        workflows: Arc<W>,
        executor: Arc<E>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            identities,
            tokens,
            agents,
            workflows,
            executor,
            clock,
            call_timeout: DEFAULT_TOOL_CALL_TIMEOUT,
        }
    }

    /// Overrides the tool-call timeout.
    #[must_use]
    pub const fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Resolves the caller and returns the live agent, active skills and the
    /// tenant's bridge token, minting one when none is active.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeSessionError::Unauthorized`] for an unknown identity
    /// token and storage errors otherwise.
    pub async fn bootstrap(&self, identity_token: &str) -> BridgeSessionResult<BridgeBootstrap> {
        let user = self.identities.resolve(identity_token).await?;
        let tenant_id = user.tenant_id;
        let token = self.active_or_mint(tenant_id).await?;
        let published_agent = self.agents.find_published(tenant_id).await?;
        let skills = self.workflows.list_skills(tenant_id).await?;
        Ok(BridgeBootstrap {
            user,
            published_agent,
            skills,
            token,
        })
    }

    /// Validates a bridge token and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeSessionError::Unauthorized`] when the token is unknown
    /// or revoked.
    pub async fn authenticate(&self, bridge_token: &str) -> BridgeSessionResult<BridgeToken> {
        let value = BridgeTokenValue::new(bridge_token);
        self.tokens
            .find_by_value(&value)
            .await?
            .filter(|token| !token.is_revoked())
            .ok_or(BridgeSessionError::Unauthorized)
    }

    /// Lists the tools a bridge may call right now.
    ///
    /// The list is empty while no agent is published.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeSessionError::Unauthorized`] for an invalid token.
    pub async fn list_tools(&self, bridge_token: &str) -> BridgeSessionResult<Vec<BridgeTool>> {
        let token = self.authenticate(bridge_token).await?;
        let Some((_, skills)) = self.live_scope(token.tenant_id()).await? else {
            return Ok(Vec::new());
        };
        Ok(tools_for_skills(&skills))
    }

    /// Runs a tool against the live agent.
    ///
    /// Executor failures and timeouts come back as error results.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeSessionError::Unauthorized`] for an invalid token and
    /// [`BridgeSessionError::ToolNotFound`] when no live skill matches,
    /// including whenever no agent is published.
    pub async fn call_tool(
        &self,
        bridge_token: &str,
        call: ToolCall,
    ) -> BridgeSessionResult<ToolCallResult> {
        let token = self.authenticate(bridge_token).await?;
        let tenant_id = token.tenant_id();
        let Some((agent, skills)) = self.live_scope(tenant_id).await? else {
            return Err(BridgeSessionError::ToolNotFound(call.name));
        };
        let Some(workflow) = select_tool(&skills, &call) else {
            return Err(BridgeSessionError::ToolNotFound(call.name));
        };

        tracing::info!(
            tenant_id = %tenant_id,
            tool = %call.name,
            agent_id = %agent.id(),
            workflow_id = %workflow.id(),
            "bridge tool call"
        );

        let execution = self.executor.execute(&agent, workflow, &call.arguments);
        let result = match tokio::time::timeout(self.call_timeout, execution).await {
            Ok(Ok(text)) => ToolCallResult::text(text),
            Ok(Err(FlowExecutorError::Failed(reason))) => {
                tracing::warn!(tool = %call.name, reason = %reason, "bridge tool call failed");
                ToolCallResult::error(format!("Workflow error: {reason}"))
            }
            Ok(Err(err)) => {
                tracing::error!(tool = %call.name, err = %err, "flow runtime unavailable");
                ToolCallResult::error(format!("Error executing tool: {err}"))
            }
            Err(_) => {
                tracing::warn!(
                    tool = %call.name,
                    workflow_id = %workflow.id(),
                    "bridge tool call timed out"
                );
                ToolCallResult::error(format!(
                    "Tool execution timed out after {}.",
                    describe_timeout(self.call_timeout)
                ))
            }
        };
        Ok(result)
    }

    /// Revokes the caller's active bridge token. The next bootstrap mints a
    /// fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeSessionError::Unauthorized`] for an unknown identity
    /// token and storage errors otherwise.
    pub async fn revoke(&self, identity_token: &str) -> BridgeSessionResult<bool> {
        let user = self.identities.resolve(identity_token).await?;
        let revoked = self.tokens.revoke_active(user.tenant_id).await?;
        if revoked {
            tracing::info!(tenant_id = %user.tenant_id, "bridge token revoked");
        }
        Ok(revoked)
    }

    async fn active_or_mint(&self, tenant_id: TenantId) -> BridgeSessionResult<BridgeToken> {
        if let Some(token) = self.tokens.find_active(tenant_id).await? {
            return Ok(token);
        }

        let token = BridgeToken::mint(tenant_id, &*self.clock);
        match self.tokens.issue(&token).await {
            Ok(()) => {
                tracing::info!(tenant_id = %tenant_id, "bridge token minted");
                Ok(token)
            }
            Err(BridgeTokenRepositoryError::ActiveTokenExists(_)) => {
                tracing::debug!(tenant_id = %tenant_id, "concurrent bootstrap minted first");
                self.tokens
                    .find_active(tenant_id)
                    .await?
                    .ok_or(BridgeSessionError::Tokens(
                        BridgeTokenRepositoryError::ActiveTokenExists(tenant_id),
                    ))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn live_scope(
        &self,
        tenant_id: TenantId,
    ) -> BridgeSessionResult<Option<(AgentComponent, Vec<Workflow>)>> {
        let Some(agent) = self.agents.find_published(tenant_id).await? else {
            return Ok(None);
        };
        let skills = self.workflows.list_skills(tenant_id).await?;
        Ok(Some((agent, skills)))
    }
}

fn select_tool<'a>(skills: &'a [Workflow], call: &ToolCall) -> Option<&'a Workflow> {
    let workflow_id = call.workflow_id.or_else(|| {
        tools_for_skills(skills)
            .into_iter()
            .find(|tool| tool.name == call.name)
            .map(|tool| tool.workflow_id)
    })?;
    skills.iter().find(|workflow| workflow.id() == workflow_id)
}

fn describe_timeout(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{} seconds", timeout.as_secs())
    } else {
        format!("{} milliseconds", timeout.as_millis())
    }
}
