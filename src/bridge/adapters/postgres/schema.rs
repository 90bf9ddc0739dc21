//! Diesel schema for bridge token persistence.

diesel::table! {
    /// Bridge credentials, one unrevoked row per tenant at most.
    bridge_tokens (token) {
        /// Bearer secret.
        token -> Text,
        /// Owning tenant.
        tenant_id -> Uuid,
        /// Issue timestamp.
        issued_at -> Timestamptz,
        /// Revocation flag.
        revoked -> Bool,
    }
}
