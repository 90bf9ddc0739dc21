//! Diesel schema for workflow persistence.

diesel::table! {
    /// Tenant workflows and their skill exposure.
    workflows (id) {
        /// Workflow identifier.
        id -> Uuid,
        /// Owning tenant.
        tenant_id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Whether the workflow is active.
        is_active -> Bool,
        /// Whether the workflow is exposed as a skill.
        is_agent_skill -> Bool,
        /// Agent components the workflow belongs to.
        agent_component_ids -> Array<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
