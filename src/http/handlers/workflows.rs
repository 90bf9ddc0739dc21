//! Workflow and skill-exposure routes.

use crate::http::{
    error::ApiError,
    extract::{ApiJson, ApiPath, Caller},
    state::AppState,
};
use crate::publication::domain::AgentComponentId;
use crate::skill::{
    domain::{Workflow, WorkflowId},
    services::CreateWorkflowRequest,
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Workflow as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowView {
    /// Workflow identifier.
    pub id: WorkflowId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Tool name the workflow is exposed under.
    pub tool_name: String,
    /// Whether the workflow is active.
    pub is_active: bool,
    /// Whether the workflow is exposed as a skill.
    pub is_agent_skill: bool,
    /// Agent components the workflow belongs to.
    pub agent_component_ids: Vec<AgentComponentId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Workflow> for WorkflowView {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id(),
            name: workflow.name().as_str().to_owned(),
            description: workflow.description().map(str::to_owned),
            tool_name: workflow.tool_name(),
            is_active: workflow.is_active(),
            is_agent_skill: workflow.is_agent_skill(),
            agent_component_ids: workflow.agent_component_ids().iter().copied().collect(),
            created_at: workflow.created_at(),
            updated_at: workflow.updated_at(),
        }
    }
}

/// Body of `POST /workflows`.
#[derive(Debug, Deserialize)]
pub struct CreateWorkflowBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "active_by_default")]
    is_active: bool,
    #[serde(default)]
    agent_component_ids: Vec<AgentComponentId>,
}

const fn active_by_default() -> bool {
    true
}

/// Body of `PATCH /workflows/{id}/agent-skill`.
#[derive(Debug, Deserialize)]
pub struct AgentSkillBody {
    is_agent_skill: bool,
}

pub(crate) async fn list(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
) -> Result<Json<Vec<WorkflowView>>, ApiError> {
    let workflows = state.skills.list(user.tenant_id).await?;
    Ok(Json(workflows.iter().map(WorkflowView::from).collect()))
}

pub(crate) async fn create(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiJson(body): ApiJson<CreateWorkflowBody>,
) -> Result<(StatusCode, Json<WorkflowView>), ApiError> {
    let request = CreateWorkflowRequest {
        name: body.name,
        description: body.description,
        is_active: body.is_active,
        agent_component_ids: body.agent_component_ids,
    };
    let workflow = state.skills.create(user.tenant_id, request).await?;
    Ok((StatusCode::CREATED, Json(WorkflowView::from(&workflow))))
}

pub(crate) async fn get(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<WorkflowId>,
) -> Result<Json<WorkflowView>, ApiError> {
    let workflow = state.skills.get(user.tenant_id, id).await?;
    Ok(Json(WorkflowView::from(&workflow)))
}

pub(crate) async fn set_agent_skill(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<WorkflowId>,
    ApiJson(body): ApiJson<AgentSkillBody>,
) -> Result<Json<WorkflowView>, ApiError> {
    let workflow = state
        .skills
        .set_skill(user.tenant_id, id, body.is_agent_skill)
        .await?;
    Ok(Json(WorkflowView::from(&workflow)))
}
