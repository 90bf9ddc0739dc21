//! In-memory bridge token repository.

use crate::bridge::{
    domain::{BridgeToken, BridgeTokenValue},
    ports::{BridgeTokenRepository, BridgeTokenRepositoryError, BridgeTokenRepositoryResult},
};
use crate::tenant::TenantId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory bridge token repository.
///
/// Revoked tokens are kept so that lookups can tell them apart from unknown
/// secrets.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBridgeTokenRepository {
    tokens: Arc<RwLock<HashMap<BridgeTokenValue, BridgeToken>>>,
}

type Tokens = HashMap<BridgeTokenValue, BridgeToken>;

impl InMemoryBridgeTokenRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> BridgeTokenRepositoryResult<RwLockReadGuard<'_, Tokens>> {
        self.tokens.read().map_err(|err| {
            BridgeTokenRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> BridgeTokenRepositoryResult<RwLockWriteGuard<'_, Tokens>> {
        self.tokens.write().map_err(|err| {
            BridgeTokenRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn is_active_for(token: &BridgeToken, tenant_id: TenantId) -> bool {
    token.tenant_id() == tenant_id && !token.is_revoked()
}

#[async_trait]
impl BridgeTokenRepository for InMemoryBridgeTokenRepository {
    async fn issue(&self, token: &BridgeToken) -> BridgeTokenRepositoryResult<()> {
        let mut tokens = self.write()?;
        let tenant_id = token.tenant_id();
        if tokens.values().any(|stored| is_active_for(stored, tenant_id)) {
            return Err(BridgeTokenRepositoryError::ActiveTokenExists(tenant_id));
        }
        tokens.insert(token.value().clone(), token.clone());
        Ok(())
    }

    async fn find_by_value(
        &self,
        value: &BridgeTokenValue,
    ) -> BridgeTokenRepositoryResult<Option<BridgeToken>> {
        Ok(self.read()?.get(value).cloned())
    }

    async fn find_active(
        &self,
        tenant_id: TenantId,
    ) -> BridgeTokenRepositoryResult<Option<BridgeToken>> {
        Ok(self
            .read()?
            .values()
            .find(|token| is_active_for(token, tenant_id))
            .cloned())
    }

    async fn revoke_active(&self, tenant_id: TenantId) -> BridgeTokenRepositoryResult<bool> {
        let mut tokens = self.write()?;
        let mut revoked = false;
        for token in tokens
            .values_mut()
            .filter(|token| is_active_for(token, tenant_id))
        {
            token.revoke();
            revoked = true;
        }
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;

    #[tokio::test(flavor = "multi_thread")]
    async fn second_active_token_is_rejected_until_revoked() {
        let repository = InMemoryBridgeTokenRepository::new();
        let tenant_id = TenantId::new();
        let first = BridgeToken::mint(tenant_id, &DefaultClock);
        repository.issue(&first).await.expect("first token stores");

        let duplicate = repository
            .issue(&BridgeToken::mint(tenant_id, &DefaultClock))
            .await;
        assert!(matches!(
            duplicate,
            Err(BridgeTokenRepositoryError::ActiveTokenExists(_))
        ));

        assert!(repository.revoke_active(tenant_id).await.expect("revoke runs"));
        repository
            .issue(&BridgeToken::mint(tenant_id, &DefaultClock))
            .await
            .expect("replacement token stores");
        let old = repository
            .find_by_value(first.value())
            .await
            .expect("lookup runs")
            .expect("revoked token is kept");
        assert!(old.is_revoked());
    }
}
