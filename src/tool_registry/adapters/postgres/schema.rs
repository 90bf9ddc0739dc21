//! Diesel schema for MCP server registry persistence.

diesel::table! {
    /// MCP server configuration records.
    mcp_servers (id) {
        /// Internal server identifier.
        id -> Uuid,
        /// Owning tenant.
        tenant_id -> Uuid,
        /// Server name, unique per tenant.
        #[max_length = 100]
        name -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Transport configuration as JSONB.
        transport -> Jsonb,
        /// Credential map as JSONB.
        credentials -> Jsonb,
        /// Whether the server is enabled.
        is_enabled -> Bool,
        /// Whether configuration changes await a sync.
        needs_sync -> Bool,
        /// Health status (`unknown`, `healthy`, `unhealthy`).
        #[max_length = 50]
        health_status -> Varchar,
        /// Optional health detail.
        health_message -> Nullable<Text>,
        /// Timestamp of the last health check.
        health_checked_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last configuration update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Queued runtime changes.
    pending_changes (id) {
        /// Change identifier.
        id -> Uuid,
        /// Owning tenant.
        tenant_id -> Uuid,
        /// Entity type (`mcp_server`).
        #[max_length = 50]
        entity_type -> Varchar,
        /// Entity identifier.
        entity_id -> Uuid,
        /// Entity name when the change was queued.
        #[max_length = 100]
        entity_name -> Varchar,
        /// Name before a rename.
        #[max_length = 100]
        previous_name -> Nullable<Varchar>,
        /// Change kind.
        #[max_length = 20]
        kind -> Varchar,
        /// Queue timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-tenant sync bookkeeping.
    mcp_sync_state (tenant_id) {
        /// Owning tenant.
        tenant_id -> Uuid,
        /// When a sync last emptied the queue.
        last_sync_at -> Timestamptz,
    }
}
