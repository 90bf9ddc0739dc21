//! Tenant identifier and user profile value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of the tenant that owns registry rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a new random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for TenantId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Profile of the user behind a tenant, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Tenant owned by this user.
    pub tenant_id: TenantId,
    /// Primary email address.
    pub email: String,
    /// Optional given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Optional family name.
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserProfile {
    /// Creates a profile with only the required fields populated.
    #[must_use]
    pub fn new(tenant_id: TenantId, email: impl Into<String>) -> Self {
        Self {
            tenant_id,
            email: email.into(),
            first_name: None,
            last_name: None,
        }
    }

    /// Sets the display names.
    #[must_use]
    pub fn with_names(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }
}
