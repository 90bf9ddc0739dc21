//! MCP server registry, health and sync routes.
//!
//! Credentials are accepted on write but never returned; responses carry
//! `has_credentials` instead.

use crate::http::{
    error::ApiError,
    extract::{ApiJson, ApiPath, Caller},
    state::AppState,
};
use crate::tool_registry::{
    domain::{
        McpServer, McpServerHealthSnapshot, McpServerHealthStatus, McpServerId,
        McpServerTemplate, McpTransport, RestartStatus, SyncReport,
    },
    services::{CreateFromTemplateRequest, CreateMcpServerRequest, UpdateMcpServerRequest},
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// MCP server as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerView {
    /// Server identifier.
    pub id: McpServerId,
    /// Server name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Transport configuration.
    pub transport: McpTransport,
    /// Whether secret values are stored for the server.
    pub has_credentials: bool,
    /// Whether the server is enabled.
    pub is_enabled: bool,
    /// Whether the runtime has yet to pick up the latest change.
    pub needs_sync: bool,
    /// Last observed health.
    pub health_status: McpServerHealthStatus,
    /// When health was last checked.
    pub last_health_check: Option<DateTime<Utc>>,
    /// Detail recorded with the last check.
    pub health_message: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&McpServer> for McpServerView {
    fn from(server: &McpServer) -> Self {
        let health = server.health();
        Self {
            id: server.id(),
            name: server.name().as_str().to_owned(),
            description: server.description().map(str::to_owned),
            transport: server.transport().clone(),
            has_credentials: !server.credentials().is_empty(),
            is_enabled: server.is_enabled(),
            needs_sync: server.needs_sync(),
            health_status: health.status(),
            last_health_check: health.checked_at(),
            health_message: health.message().map(str::to_owned),
            created_at: server.created_at(),
            updated_at: server.updated_at(),
        }
    }
}

/// Body of `POST /mcp-servers`.
#[derive(Debug, Deserialize)]
pub struct CreateMcpServerBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
    transport: McpTransport,
    #[serde(default)]
    credentials: BTreeMap<String, String>,
    #[serde(default = "enabled_by_default")]
    is_enabled: bool,
}

const fn enabled_by_default() -> bool {
    true
}

/// Body of `POST /mcp-servers/test-connection`.
#[derive(Debug, Deserialize)]
pub struct TestConnectionBody {
    transport: McpTransport,
    #[serde(default)]
    credentials: BTreeMap<String, String>,
}

/// Outcome of a connection test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestView {
    /// Whether the server answered or the command started.
    pub success: bool,
    /// Observed health.
    pub status: McpServerHealthStatus,
    /// Detail reported by the check.
    pub message: Option<String>,
    /// When the check ran.
    pub checked_at: Option<DateTime<Utc>>,
}

impl From<&McpServerHealthSnapshot> for ConnectionTestView {
    fn from(snapshot: &McpServerHealthSnapshot) -> Self {
        Self {
            success: snapshot.status() == McpServerHealthStatus::Healthy,
            status: snapshot.status(),
            message: snapshot.message().map(str::to_owned),
            checked_at: snapshot.checked_at(),
        }
    }
}

/// Body of `PATCH /mcp-servers/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateMcpServerBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    transport: Option<McpTransport>,
    #[serde(default)]
    credentials: Option<BTreeMap<String, String>>,
    #[serde(default)]
    is_enabled: Option<bool>,
}

/// Body of `POST /mcp-servers/from-template`.
#[derive(Debug, Deserialize)]
pub struct FromTemplateBody {
    template: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    credentials: BTreeMap<String, String>,
}

fn views(servers: &[McpServer]) -> Vec<McpServerView> {
    servers.iter().map(McpServerView::from).collect()
}

pub(crate) async fn list(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
) -> Result<Json<Vec<McpServerView>>, ApiError> {
    let servers = state.mcp_servers.list(user.tenant_id).await?;
    Ok(Json(views(&servers)))
}

pub(crate) async fn create(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiJson(body): ApiJson<CreateMcpServerBody>,
) -> Result<(StatusCode, Json<McpServerView>), ApiError> {
    let request = CreateMcpServerRequest {
        name: body.name,
        description: body.description,
        transport: body.transport,
        credentials: body.credentials,
        is_enabled: body.is_enabled,
    };
    let server = state.mcp_servers.create(user.tenant_id, request).await?;
    Ok((StatusCode::CREATED, Json(McpServerView::from(&server))))
}

pub(crate) async fn templates(
    State(state): State<Arc<AppState>>,
    Caller(_): Caller,
) -> Json<&'static [McpServerTemplate]> {
    Json(state.mcp_servers.templates())
}

pub(crate) async fn create_from_template(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiJson(body): ApiJson<FromTemplateBody>,
) -> Result<(StatusCode, Json<McpServerView>), ApiError> {
    let request = CreateFromTemplateRequest {
        template: body.template,
        name: body.name,
        description: body.description,
        env: body.env,
        credentials: body.credentials,
    };
    let server = state
        .mcp_servers
        .create_from_template(user.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(McpServerView::from(&server))))
}

pub(crate) async fn get(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<McpServerId>,
) -> Result<Json<McpServerView>, ApiError> {
    let server = state.mcp_servers.get(user.tenant_id, id).await?;
    Ok(Json(McpServerView::from(&server)))
}

pub(crate) async fn update(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<McpServerId>,
    ApiJson(body): ApiJson<UpdateMcpServerBody>,
) -> Result<Json<McpServerView>, ApiError> {
    let request = UpdateMcpServerRequest {
        name: body.name,
        description: body.description,
        transport: body.transport,
        credentials: body.credentials,
        is_enabled: body.is_enabled,
    };
    let server = state.mcp_servers.update(user.tenant_id, id, request).await?;
    Ok(Json(McpServerView::from(&server)))
}

pub(crate) async fn delete(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<McpServerId>,
) -> Result<StatusCode, ApiError> {
    state.mcp_servers.delete(user.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn enable(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<McpServerId>,
) -> Result<Json<McpServerView>, ApiError> {
    let server = state.mcp_servers.enable(user.tenant_id, id).await?;
    Ok(Json(McpServerView::from(&server)))
}

pub(crate) async fn disable(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<McpServerId>,
) -> Result<Json<McpServerView>, ApiError> {
    let server = state.mcp_servers.disable(user.tenant_id, id).await?;
    Ok(Json(McpServerView::from(&server)))
}

pub(crate) async fn check_health(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<McpServerId>,
) -> Result<Json<McpServerView>, ApiError> {
    let server = state.health.check(user.tenant_id, id).await?;
    Ok(Json(McpServerView::from(&server)))
}

pub(crate) async fn test_connection(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiJson(body): ApiJson<TestConnectionBody>,
) -> Result<Json<ConnectionTestView>, ApiError> {
    let draft = state.mcp_servers.draft_for_connection_test(
        user.tenant_id,
        body.transport,
        body.credentials,
    )?;
    let snapshot = state.health.test_connection(&draft).await;
    Ok(Json(ConnectionTestView::from(&snapshot)))
}

pub(crate) async fn sync(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
) -> Result<Json<SyncReport>, ApiError> {
    Ok(Json(state.restart.sync(user.tenant_id).await?))
}

pub(crate) async fn restart_status(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
) -> Result<Json<RestartStatus>, ApiError> {
    Ok(Json(state.restart.restart_status(user.tenant_id).await?))
}
