//! `PostgreSQL` repository implementation for bridge tokens.
//!
//! The partial unique index `idx_bridge_tokens_one_active` on `(tenant_id)
//! WHERE NOT revoked` rejects a second active token for a tenant.

use super::{models::BridgeTokenRow, schema::bridge_tokens};
use crate::bridge::{
    domain::{BridgeToken, BridgeTokenValue, PersistedBridgeTokenData},
    ports::{BridgeTokenRepository, BridgeTokenRepositoryError, BridgeTokenRepositoryResult},
};
use crate::tenant::TenantId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type for bridge adapters.
pub type BridgePgPool = Pool<ConnectionManager<PgConnection>>;

const ACTIVE_TOKEN_INDEX: &str = "idx_bridge_tokens_one_active";

/// `PostgreSQL`-backed bridge token repository.
#[derive(Debug, Clone)]
pub struct PostgresBridgeTokenRepository {
    pool: BridgePgPool,
}

impl PostgresBridgeTokenRepository {
    /// Creates a new repository from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: BridgePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> BridgeTokenRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BridgeTokenRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(BridgeTokenRepositoryError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(BridgeTokenRepositoryError::persistence)?
    }
}

#[async_trait]
impl BridgeTokenRepository for PostgresBridgeTokenRepository {
    async fn issue(&self, token: &BridgeToken) -> BridgeTokenRepositoryResult<()> {
        let tenant_id = token.tenant_id();
        let row = to_row(token);
        self.run_blocking(move |connection| {
            diesel::insert_into(bridge_tokens::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if info.constraint_name() == Some(ACTIVE_TOKEN_INDEX) =>
                    {
                        BridgeTokenRepositoryError::ActiveTokenExists(tenant_id)
                    }
                    _ => BridgeTokenRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_value(
        &self,
        value: &BridgeTokenValue,
    ) -> BridgeTokenRepositoryResult<Option<BridgeToken>> {
        let secret = value.expose().to_owned();
        self.run_blocking(move |connection| {
            let row = bridge_tokens::table
                .filter(bridge_tokens::token.eq(secret))
                .select(BridgeTokenRow::as_select())
                .first::<BridgeTokenRow>(connection)
                .optional()
                .map_err(BridgeTokenRepositoryError::persistence)?;
            Ok(row.map(row_to_token))
        })
        .await
    }

    async fn find_active(
        &self,
        tenant_id: TenantId,
    ) -> BridgeTokenRepositoryResult<Option<BridgeToken>> {
        self.run_blocking(move |connection| {
            let row = bridge_tokens::table
                .filter(bridge_tokens::tenant_id.eq(tenant_id.into_inner()))
                .filter(bridge_tokens::revoked.eq(false))
                .select(BridgeTokenRow::as_select())
                .first::<BridgeTokenRow>(connection)
                .optional()
                .map_err(BridgeTokenRepositoryError::persistence)?;
            Ok(row.map(row_to_token))
        })
        .await
    }

    async fn revoke_active(&self, tenant_id: TenantId) -> BridgeTokenRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                bridge_tokens::table
                    .filter(bridge_tokens::tenant_id.eq(tenant_id.into_inner()))
                    .filter(bridge_tokens::revoked.eq(false)),
            )
            .set(bridge_tokens::revoked.eq(true))
            .execute(connection)
            .map_err(BridgeTokenRepositoryError::persistence)?;
            Ok(updated > 0)
        })
        .await
    }
}

fn to_row(token: &BridgeToken) -> BridgeTokenRow {
    BridgeTokenRow {
        token: token.value().expose().to_owned(),
        tenant_id: token.tenant_id().into_inner(),
        issued_at: token.issued_at(),
        revoked: token.is_revoked(),
    }
}

fn row_to_token(row: BridgeTokenRow) -> BridgeToken {
    BridgeToken::from_persisted(PersistedBridgeTokenData {
        value: BridgeTokenValue::new(row.token),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        issued_at: row.issued_at,
        revoked: row.revoked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;

    #[test]
    fn row_round_trip_keeps_secret_and_revocation() {
        let mut token = BridgeToken::mint(TenantId::new(), &DefaultClock);
        token.revoke();

        let restored = row_to_token(to_row(&token));

        assert_eq!(restored, token);
    }
}
