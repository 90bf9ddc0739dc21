//! Repository port for bridge tokens.

use crate::bridge::domain::{BridgeToken, BridgeTokenValue};
use crate::tenant::TenantId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for bridge token repository operations.
pub type BridgeTokenRepositoryResult<T> = Result<T, BridgeTokenRepositoryError>;

/// Persistence contract for bridge tokens.
///
/// A tenant holds at most one unrevoked token at a time.
#[async_trait]
pub trait BridgeTokenRepository: Send + Sync {
    /// Stores a freshly minted token.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeTokenRepositoryError::ActiveTokenExists`] when the
    /// tenant already holds an unrevoked token.
    async fn issue(&self, token: &BridgeToken) -> BridgeTokenRepositoryResult<()>;

    /// Finds a token, revoked or not, by its secret.
    async fn find_by_value(
        &self,
        value: &BridgeTokenValue,
    ) -> BridgeTokenRepositoryResult<Option<BridgeToken>>;

    /// Finds the tenant's unrevoked token.
    async fn find_active(
        &self,
        tenant_id: TenantId,
    ) -> BridgeTokenRepositoryResult<Option<BridgeToken>>;

    /// Revokes the tenant's unrevoked token and returns whether one existed.
    async fn revoke_active(&self, tenant_id: TenantId) -> BridgeTokenRepositoryResult<bool>;
}

/// Errors returned by bridge token repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BridgeTokenRepositoryError {
    /// The tenant already holds an unrevoked token.
    #[error("tenant {0} already holds an active bridge token")]
    ActiveTokenExists(TenantId),

    /// Persistence layer error.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BridgeTokenRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
