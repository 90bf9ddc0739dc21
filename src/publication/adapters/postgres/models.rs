//! Diesel row models for agent component persistence.

use super::schema::agent_components;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for agent components.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = agent_components)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AgentComponentRow {
    /// Component identifier.
    pub id: uuid::Uuid,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional "who" answer.
    pub qa_who: Option<String>,
    /// Optional rules answer.
    pub qa_rules: Option<String>,
    /// Publication flag.
    pub is_published: bool,
    /// Publication timestamp.
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for agent components.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = agent_components)]
pub struct NewAgentComponentRow {
    /// Component identifier.
    pub id: uuid::Uuid,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional "who" answer.
    pub qa_who: Option<String>,
    /// Optional rules answer.
    pub qa_rules: Option<String>,
    /// Publication flag.
    pub is_published: bool,
    /// Publication timestamp.
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
