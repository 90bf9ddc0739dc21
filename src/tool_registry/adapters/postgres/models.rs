//! Diesel row models for MCP server registry persistence.

use super::schema::{mcp_servers, mcp_sync_state, pending_changes};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for MCP server records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mcp_servers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct McpServerRow {
    /// Internal server identifier.
    pub id: uuid::Uuid,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Server name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Transport configuration payload.
    pub transport: Value,
    /// Credential payload.
    pub credentials: Value,
    /// Enabled flag.
    pub is_enabled: bool,
    /// Sync flag.
    pub needs_sync: bool,
    /// Health status.
    pub health_status: String,
    /// Optional health message.
    pub health_message: Option<String>,
    /// Optional health check timestamp.
    pub health_checked_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for MCP server records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mcp_servers)]
pub struct NewMcpServerRow {
    /// Internal server identifier.
    pub id: uuid::Uuid,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Server name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Transport configuration payload.
    pub transport: Value,
    /// Credential payload.
    pub credentials: Value,
    /// Enabled flag.
    pub is_enabled: bool,
    /// Sync flag.
    pub needs_sync: bool,
    /// Health status.
    pub health_status: String,
    /// Optional health message.
    pub health_message: Option<String>,
    /// Optional health check timestamp.
    pub health_checked_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Configuration columns written by registry updates.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = mcp_servers)]
#[diesel(treat_none_as_null = true)]
pub struct McpServerConfigChangeset {
    /// Server name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Transport configuration payload.
    pub transport: Value,
    /// Credential payload.
    pub credentials: Value,
    /// Enabled flag.
    pub is_enabled: bool,
    /// Sync flag.
    pub needs_sync: bool,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query and insert row for pending changes.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = pending_changes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PendingChangeRow {
    /// Change identifier.
    pub id: uuid::Uuid,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Entity type.
    pub entity_type: String,
    /// Entity identifier.
    pub entity_id: uuid::Uuid,
    /// Entity name.
    pub entity_name: String,
    /// Name before a rename.
    pub previous_name: Option<String>,
    /// Change kind.
    pub kind: String,
    /// Queue timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert row for sync bookkeeping.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mcp_sync_state)]
pub struct SyncStateRow {
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// When a sync last emptied the queue.
    pub last_sync_at: DateTime<Utc>,
}
