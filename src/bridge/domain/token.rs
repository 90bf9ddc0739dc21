//! Bridge token value types.

use crate::tenant::TenantId;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use mockable::Clock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by every minted bridge token.
pub const TOKEN_PREFIX: &str = "brg_";

const TOKEN_BYTES: usize = 48;

/// Opaque bearer secret presented by a bridge.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BridgeTokenValue(String);

impl BridgeTokenValue {
    /// Generates a fresh random token value.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rand::rng().fill(&mut bytes);
        Self(format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Wraps a token presented by a caller or loaded from storage.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret as sent on the wire.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BridgeTokenValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("BridgeTokenValue(<redacted>)")
    }
}

/// Long-lived credential that lets a remote bridge act for a tenant.
///
/// The token carries no scope. What a bridge may see is resolved from the
/// registries on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeToken {
    value: BridgeTokenValue,
    tenant_id: TenantId,
    issued_at: DateTime<Utc>,
    revoked: bool,
}

/// Parameter object for reconstructing a persisted bridge token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBridgeTokenData {
    /// Stored secret.
    pub value: BridgeTokenValue,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Issue timestamp.
    pub issued_at: DateTime<Utc>,
    /// Whether the token has been revoked.
    pub revoked: bool,
}

impl BridgeToken {
    /// Mints a new active token for the tenant.
    #[must_use]
    pub fn mint(tenant_id: TenantId, clock: &impl Clock) -> Self {
        Self {
            value: BridgeTokenValue::generate(),
            tenant_id,
            issued_at: clock.utc(),
            revoked: false,
        }
    }

    /// Reconstructs a token from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedBridgeTokenData) -> Self {
        Self {
            value: data.value,
            tenant_id: data.tenant_id,
            issued_at: data.issued_at,
            revoked: data.revoked,
        }
    }

    /// Returns the secret.
    #[must_use]
    pub const fn value(&self) -> &BridgeTokenValue {
        &self.value
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the issue timestamp.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns whether the token has been revoked.
    #[must_use]
    pub const fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Marks the token revoked.
    pub const fn revoke(&mut self) {
        self.revoked = true;
    }
}
