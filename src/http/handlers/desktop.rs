//! Desktop connector bootstrap and token revocation.

use crate::bridge::services::BridgeBootstrap;
use crate::http::{error::ApiError, extract::Bearer, state::AppState};
use crate::publication::domain::{AgentComponent, AgentComponentId};
use crate::skill::domain::{Workflow, WorkflowId};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Caller identity as shown to the desktop connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapUser {
    /// Primary email address.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
}

/// Live agent summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAgent {
    /// Component identifier.
    pub id: AgentComponentId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// "Who is this agent" answer.
    pub qa_who: Option<String>,
    /// Always `true`; kept for connector compatibility.
    pub is_published: bool,
}

impl From<&AgentComponent> for BootstrapAgent {
    fn from(agent: &AgentComponent) -> Self {
        let persona = agent.persona();
        Self {
            id: agent.id(),
            name: persona.name().to_owned(),
            description: persona.description().map(str::to_owned),
            qa_who: persona.qa_who().map(str::to_owned),
            is_published: agent.is_published(),
        }
    }
}

/// Skill summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapSkill {
    /// Workflow identifier.
    pub id: WorkflowId,
    /// Workflow name.
    pub name: String,
    /// Description, generated when the workflow has none.
    pub description: String,
    /// Whether the workflow is active.
    pub is_active: bool,
}

impl From<&Workflow> for BootstrapSkill {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id(),
            name: workflow.name().as_str().to_owned(),
            description: crate::bridge::domain::skill_description(workflow),
            is_active: workflow.is_active(),
        }
    }
}

/// Response of `GET /desktop/bootstrap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapView {
    /// Caller identity.
    pub user: BootstrapUser,
    /// Live agent, or `null` when none is published.
    pub published_agent: Option<BootstrapAgent>,
    /// Active skill workflows.
    pub skills: Vec<BootstrapSkill>,
    /// Bridge token for the MCP routes.
    pub mcp_token: String,
}

impl From<BridgeBootstrap> for BootstrapView {
    fn from(bootstrap: BridgeBootstrap) -> Self {
        let BridgeBootstrap {
            user,
            published_agent,
            skills,
            token,
        } = bootstrap;
        Self {
            user: BootstrapUser {
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
            },
            published_agent: published_agent.as_ref().map(BootstrapAgent::from),
            skills: skills.iter().map(BootstrapSkill::from).collect(),
            mcp_token: token.value().expose().to_owned(),
        }
    }
}

/// Response of `POST /desktop/bridge-token/revoke`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeView {
    /// Whether an active token existed.
    pub revoked: bool,
}

pub(crate) async fn bootstrap(
    State(state): State<Arc<AppState>>,
    Bearer(identity): Bearer,
) -> Result<Json<BootstrapView>, ApiError> {
    let bootstrap = state.bridge.bootstrap(&identity).await?;
    Ok(Json(BootstrapView::from(bootstrap)))
}

pub(crate) async fn revoke_token(
    State(state): State<Arc<AppState>>,
    Bearer(identity): Bearer,
) -> Result<Json<RevokeView>, ApiError> {
    let revoked = state.bridge.revoke(&identity).await?;
    Ok(Json(RevokeView { revoked }))
}
