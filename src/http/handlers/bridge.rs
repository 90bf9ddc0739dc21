//! Bridge-token routes used by desktop MCP connectors.

use crate::bridge::{
    domain::{BridgeTool, ToolCallResult},
    services::ToolCall,
};
use crate::http::{
    error::ApiError,
    extract::{ApiJson, ApiPath, Bearer},
    state::AppState,
};
use crate::skill::domain::WorkflowId;
use crate::tenant::TenantId;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Response of the tool listing routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListView {
    /// Tools callable right now.
    pub tools: Vec<BridgeTool>,
}

/// Body of the tool call routes.
#[derive(Debug, Deserialize)]
pub struct ToolCallBody {
    name: String,
    #[serde(default)]
    arguments: Value,
    #[serde(default)]
    workflow_id: Option<WorkflowId>,
}

impl From<ToolCallBody> for ToolCall {
    fn from(body: ToolCallBody) -> Self {
        Self {
            name: body.name,
            arguments: body.arguments,
            workflow_id: body.workflow_id,
        }
    }
}

async fn ensure_tenant(state: &AppState, token: &str, tenant_id: TenantId) -> Result<(), ApiError> {
    let issued = state.bridge.authenticate(token).await?;
    if issued.tenant_id() == tenant_id {
        Ok(())
    } else {
        Err(ApiError::unauthorized("bridge token does not belong to this user"))
    }
}

pub(crate) async fn list_tools(
    State(state): State<Arc<AppState>>,
    Bearer(token): Bearer,
) -> Result<Json<ToolListView>, ApiError> {
    let tools = state.bridge.list_tools(&token).await?;
    Ok(Json(ToolListView { tools }))
}

pub(crate) async fn call_tool(
    State(state): State<Arc<AppState>>,
    Bearer(token): Bearer,
    ApiJson(body): ApiJson<ToolCallBody>,
) -> Result<Json<ToolCallResult>, ApiError> {
    let result = state.bridge.call_tool(&token, body.into()).await?;
    Ok(Json(result))
}

pub(crate) async fn list_user_tools(
    State(state): State<Arc<AppState>>,
    Bearer(token): Bearer,
    ApiPath(user_id): ApiPath<TenantId>,
) -> Result<Json<ToolListView>, ApiError> {
    ensure_tenant(&state, &token, user_id).await?;
    let tools = state.bridge.list_tools(&token).await?;
    Ok(Json(ToolListView { tools }))
}

pub(crate) async fn call_user_tool(
    State(state): State<Arc<AppState>>,
    Bearer(token): Bearer,
    ApiPath(user_id): ApiPath<TenantId>,
    ApiJson(body): ApiJson<ToolCallBody>,
) -> Result<Json<ToolCallResult>, ApiError> {
    ensure_tenant(&state, &token, user_id).await?;
    let result = state.bridge.call_tool(&token, body.into()).await?;
    Ok(Json(result))
}
