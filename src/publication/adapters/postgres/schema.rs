//! Diesel schema for agent component persistence.

diesel::table! {
    /// Agent components authored by tenants.
    agent_components (id) {
        /// Component identifier.
        id -> Uuid,
        /// Owning tenant.
        tenant_id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Optional "who is this agent" answer.
        qa_who -> Nullable<Text>,
        /// Optional rules answer.
        qa_rules -> Nullable<Text>,
        /// Publication flag; unique per tenant while true.
        is_published -> Bool,
        /// Timestamp of the current publication.
        published_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
