//! Agent component routes.

use crate::http::{
    error::ApiError,
    extract::{ApiJson, ApiPath, Caller},
    state::AppState,
};
use crate::publication::{
    domain::{AgentComponent, AgentComponentId},
    services::CreateAgentComponentRequest,
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Agent component as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentComponentView {
    /// Component identifier.
    pub id: AgentComponentId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// "Who is this agent" answer.
    pub qa_who: Option<String>,
    /// Rules answer.
    pub qa_rules: Option<String>,
    /// Whether this is the tenant's live agent.
    pub is_published: bool,
    /// When the component was last published.
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&AgentComponent> for AgentComponentView {
    fn from(agent: &AgentComponent) -> Self {
        let persona = agent.persona();
        Self {
            id: agent.id(),
            name: persona.name().to_owned(),
            description: persona.description().map(str::to_owned),
            qa_who: persona.qa_who().map(str::to_owned),
            qa_rules: persona.qa_rules().map(str::to_owned),
            is_published: agent.is_published(),
            published_at: agent.published_at(),
            created_at: agent.created_at(),
            updated_at: agent.updated_at(),
        }
    }
}

/// Publish response: the live component plus whatever it replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedView {
    /// The newly live component.
    #[serde(flatten)]
    pub agent: AgentComponentView,
    /// Components that were unpublished by this call.
    pub demoted: Vec<AgentComponentId>,
}

/// Body of `POST /agent-components`.
#[derive(Debug, Deserialize)]
pub struct CreateAgentComponentBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    qa_who: Option<String>,
    #[serde(default)]
    qa_rules: Option<String>,
}

pub(crate) async fn list(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
) -> Result<Json<Vec<AgentComponentView>>, ApiError> {
    let agents = state.publication.list(user.tenant_id).await?;
    Ok(Json(agents.iter().map(AgentComponentView::from).collect()))
}

pub(crate) async fn create(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiJson(body): ApiJson<CreateAgentComponentBody>,
) -> Result<(StatusCode, Json<AgentComponentView>), ApiError> {
    let request = CreateAgentComponentRequest {
        name: body.name,
        description: body.description,
        qa_who: body.qa_who,
        qa_rules: body.qa_rules,
    };
    let agent = state.publication.create(user.tenant_id, request).await?;
    Ok((StatusCode::CREATED, Json(AgentComponentView::from(&agent))))
}

pub(crate) async fn get(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<AgentComponentId>,
) -> Result<Json<AgentComponentView>, ApiError> {
    let agent = state.publication.get(user.tenant_id, id).await?;
    Ok(Json(AgentComponentView::from(&agent)))
}

pub(crate) async fn publish(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<AgentComponentId>,
) -> Result<Json<PublishedView>, ApiError> {
    let outcome = state.publication.publish(user.tenant_id, id).await?;
    Ok(Json(PublishedView {
        agent: AgentComponentView::from(outcome.agent()),
        demoted: outcome.demoted().to_vec(),
    }))
}

pub(crate) async fn unpublish(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<AgentComponentId>,
) -> Result<Json<AgentComponentView>, ApiError> {
    let agent = state.publication.unpublish(user.tenant_id, id).await?;
    Ok(Json(AgentComponentView::from(&agent)))
}
