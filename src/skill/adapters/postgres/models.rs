//! Diesel row models for workflow persistence.

use super::schema::workflows;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for workflows.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = workflows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowRow {
    /// Workflow identifier.
    pub id: uuid::Uuid,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Activity flag.
    pub is_active: bool,
    /// Skill flag.
    pub is_agent_skill: bool,
    /// Associated agent components.
    pub agent_component_ids: Vec<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for workflows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = workflows)]
pub struct NewWorkflowRow {
    /// Workflow identifier.
    pub id: uuid::Uuid,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Activity flag.
    pub is_active: bool,
    /// Skill flag.
    pub is_agent_skill: bool,
    /// Associated agent components.
    pub agent_component_ids: Vec<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
