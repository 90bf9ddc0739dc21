//! Diesel row model for bridge tokens.

use super::schema::bridge_tokens;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Bridge token row, used for both queries and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = bridge_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BridgeTokenRow {
    /// Bearer secret.
    pub token: String,
    /// Owning tenant.
    pub tenant_id: uuid::Uuid,
    /// Issue timestamp.
    pub issued_at: DateTime<Utc>,
    /// Revocation flag.
    pub revoked: bool,
}
