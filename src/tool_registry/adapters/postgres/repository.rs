//! `PostgreSQL` repository implementation for MCP servers and the change queue.
//!
//! Each configuration write and its queue entry share a transaction.
//! Completion runs `SERIALIZABLE` so that a change queued while a sync is
//! finishing keeps its server marked as needing a sync.
//!
//! Credentials are sealed with the configured [`CredentialCipher`] before
//! they are written; without one they are stored as a plaintext object.
//!
//! Sync leases are session advisory locks keyed by tenant. The locking
//! connection stays checked out of the pool until the lease is dropped.

use super::{
    models::{
        McpServerConfigChangeset, McpServerRow, NewMcpServerRow, PendingChangeRow, SyncStateRow,
    },
    schema::{mcp_servers, mcp_sync_state, pending_changes},
};
use crate::tenant::TenantId;
use crate::tool_registry::adapters::cipher::{self, CredentialCipher, CredentialCipherError};
use crate::tool_registry::{
    domain::{
        ChangeEntity, ChangeKind, McpCredentials, McpServer, McpServerHealthSnapshot,
        McpServerHealthStatus, McpServerId, McpServerName, McpTransport, PendingChange,
        PendingChangeId, PersistedMcpServerData, PersistedPendingChangeData, RestartStatus,
    },
    ports::{
        McpServerRegistryError, McpServerRegistryRepository, McpServerRegistryResult, SyncLease,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sql_types::Text;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;

/// `PostgreSQL` connection pool type for MCP server adapters.
pub type McpServerPgPool = Pool<ConnectionManager<PgConnection>>;

const TENANT_NAME_INDEX: &str = "idx_mcp_servers_tenant_name";
const SYNC_LOCK_PREFIX: &str = "switchboard.mcp_sync:";

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed repository for MCP server registry records.
#[derive(Debug, Clone)]
pub struct PostgresMcpServerRegistry {
    pool: McpServerPgPool,
    cipher: Option<CredentialCipher>,
}

impl PostgresMcpServerRegistry {
    /// Creates a new repository from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: McpServerPgPool) -> Self {
        Self { pool, cipher: None }
    }

    /// Seals credentials with `cipher` on every write.
    #[must_use]
    pub fn with_cipher(mut self, cipher: CredentialCipher) -> Self {
        self.cipher = Some(cipher);
        self
    }

    async fn run_blocking<F, T>(&self, operation: F) -> McpServerRegistryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> McpServerRegistryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(McpServerRegistryError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(McpServerRegistryError::persistence)?
    }
}

impl From<DieselError> for McpServerRegistryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl McpServerRegistryRepository for PostgresMcpServerRegistry {
    async fn register(
        &self,
        server: &McpServer,
        change: &PendingChange,
    ) -> McpServerRegistryResult<()> {
        let server_id = server.id();
        let server_name = server.name().clone();
        let new_row = to_new_row(server, self.cipher.as_ref())?;
        let change_row = to_change_row(change);

        self.run_blocking(move |connection| {
            connection.transaction::<_, McpServerRegistryError, _>(|tx| {
                diesel::insert_into(mcp_servers::table)
                    .values(&new_row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                            if is_name_unique_violation(info.as_ref()) =>
                        {
                            McpServerRegistryError::DuplicateServerName(server_name.clone())
                        }
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            McpServerRegistryError::DuplicateServer(server_id)
                        }
                        _ => McpServerRegistryError::persistence(err),
                    })?;
                diesel::insert_into(pending_changes::table)
                    .values(&change_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn update(
        &self,
        server: &McpServer,
        change: &PendingChange,
    ) -> McpServerRegistryResult<()> {
        let server_id = server.id();
        let server_name = server.name().clone();
        let changeset = to_changeset(server, self.cipher.as_ref())?;
        let change_row = to_change_row(change);

        self.run_blocking(move |connection| {
            connection.transaction::<_, McpServerRegistryError, _>(|tx| {
                let updated_count = diesel::update(
                    mcp_servers::table.filter(mcp_servers::id.eq(server_id.into_inner())),
                )
                .set(&changeset)
                .execute(tx)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_name_unique_violation(info.as_ref()) =>
                    {
                        McpServerRegistryError::DuplicateServerName(server_name.clone())
                    }
                    _ => McpServerRegistryError::persistence(err),
                })?;

                if updated_count == 0 {
                    return Err(McpServerRegistryError::NotFound(server_id));
                }
                diesel::insert_into(pending_changes::table)
                    .values(&change_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn delete(
        &self,
        server_id: McpServerId,
        change: &PendingChange,
    ) -> McpServerRegistryResult<()> {
        let change_row = to_change_row(change);

        self.run_blocking(move |connection| {
            connection.transaction::<_, McpServerRegistryError, _>(|tx| {
                let deleted_count = diesel::delete(
                    mcp_servers::table.filter(mcp_servers::id.eq(server_id.into_inner())),
                )
                .execute(tx)?;
                if deleted_count == 0 {
                    return Err(McpServerRegistryError::NotFound(server_id));
                }
                diesel::insert_into(pending_changes::table)
                    .values(&change_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(
        &self,
        server_id: McpServerId,
    ) -> McpServerRegistryResult<Option<McpServer>> {
        let cipher = self.cipher.clone();
        self.run_blocking(move |connection| {
            let row = mcp_servers::table
                .filter(mcp_servers::id.eq(server_id.into_inner()))
                .select(McpServerRow::as_select())
                .first::<McpServerRow>(connection)
                .optional()?;
            row.map(|found| row_to_server(found, cipher.as_ref()))
                .transpose()
        })
        .await
    }

    async fn find_by_name(
        &self,
        tenant_id: TenantId,
        server_name: &McpServerName,
    ) -> McpServerRegistryResult<Option<McpServer>> {
        let name = server_name.as_str().to_owned();
        let cipher = self.cipher.clone();
        self.run_blocking(move |connection| {
            let row = mcp_servers::table
                .filter(mcp_servers::tenant_id.eq(tenant_id.into_inner()))
                .filter(mcp_servers::name.eq(&name))
                .select(McpServerRow::as_select())
                .first::<McpServerRow>(connection)
                .optional()?;
            row.map(|found| row_to_server(found, cipher.as_ref()))
                .transpose()
        })
        .await
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> McpServerRegistryResult<Vec<McpServer>> {
        let cipher = self.cipher.clone();
        self.run_blocking(move |connection| {
            let rows = mcp_servers::table
                .filter(mcp_servers::tenant_id.eq(tenant_id.into_inner()))
                .order(mcp_servers::name.asc())
                .select(McpServerRow::as_select())
                .load::<McpServerRow>(connection)?;
            rows.into_iter()
                .map(|row| row_to_server(row, cipher.as_ref()))
                .collect()
        })
        .await
    }

    async fn list_enabled(&self) -> McpServerRegistryResult<Vec<McpServer>> {
        let cipher = self.cipher.clone();
        self.run_blocking(move |connection| {
            let rows = mcp_servers::table
                .filter(mcp_servers::is_enabled.eq(true))
                .order(mcp_servers::created_at.asc())
                .select(McpServerRow::as_select())
                .load::<McpServerRow>(connection)?;
            rows.into_iter()
                .map(|row| row_to_server(row, cipher.as_ref()))
                .collect()
        })
        .await
    }

    async fn record_health(
        &self,
        server_id: McpServerId,
        snapshot: &McpServerHealthSnapshot,
    ) -> McpServerRegistryResult<()> {
        let status = snapshot.status().as_str().to_owned();
        let message = snapshot.message().map(str::to_owned);
        let checked_at = snapshot.checked_at();

        self.run_blocking(move |connection| {
            let updated_count = diesel::update(
                mcp_servers::table.filter(mcp_servers::id.eq(server_id.into_inner())),
            )
            .set((
                mcp_servers::health_status.eq(&status),
                mcp_servers::health_message.eq(&message),
                mcp_servers::health_checked_at.eq(checked_at),
            ))
            .execute(connection)?;
            if updated_count == 0 {
                return Err(McpServerRegistryError::NotFound(server_id));
            }
            Ok(())
        })
        .await
    }

    async fn pending_changes(
        &self,
        tenant_id: TenantId,
    ) -> McpServerRegistryResult<Vec<PendingChange>> {
        self.run_blocking(move |connection| load_changes(connection, tenant_id))
            .await
    }

    async fn complete_changes(
        &self,
        tenant_id: TenantId,
        applied: &[PendingChangeId],
        synced_at: DateTime<Utc>,
    ) -> McpServerRegistryResult<RestartStatus> {
        let applied_ids: Vec<uuid::Uuid> = applied
            .iter()
            .map(|change_id| change_id.into_inner())
            .collect();

        self.run_blocking(move |connection| {
            connection
                .build_transaction()
                .serializable()
                .run::<_, McpServerRegistryError, _>(|tx| {
                    complete_in_transaction(tx, tenant_id, &applied_ids, synced_at)
                })
        })
        .await
    }

    async fn last_sync_at(
        &self,
        tenant_id: TenantId,
    ) -> McpServerRegistryResult<Option<DateTime<Utc>>> {
        self.run_blocking(move |connection| load_last_sync(connection, tenant_id))
            .await
    }

    async fn acquire_sync_lease(&self, tenant_id: TenantId) -> McpServerRegistryResult<SyncLease> {
        let pool = self.pool.clone();
        let connection = tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(McpServerRegistryError::persistence)?;
            diesel::sql_query("SELECT pg_advisory_lock(hashtext($1))")
                .bind::<Text, _>(sync_lock_key(tenant_id))
                .execute(&mut connection)?;
            Ok::<_, McpServerRegistryError>(connection)
        })
        .await
        .map_err(McpServerRegistryError::persistence)??;

        tracing::debug!(tenant_id = %tenant_id, "sync lease acquired");
        Ok(SyncLease::new(
            tenant_id,
            AdvisoryLockGuard {
                connection: Some(connection),
            },
        ))
    }
}

fn sync_lock_key(tenant_id: TenantId) -> String {
    format!("{SYNC_LOCK_PREFIX}{tenant_id}")
}

/// Holds the connection owning a session advisory lock.
struct AdvisoryLockGuard {
    connection: Option<PgPooledConnection>,
}

impl Drop for AdvisoryLockGuard {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => drop(handle.spawn_blocking(move || release_advisory_locks(connection))),
            Err(_) => release_advisory_locks(connection),
        }
    }
}

fn release_advisory_locks(mut connection: PgPooledConnection) {
    if let Err(err) = diesel::sql_query("SELECT pg_advisory_unlock_all()").execute(&mut connection) {
        tracing::warn!(error = %err, "failed to release sync lease");
    }
}

fn complete_in_transaction(
    tx: &mut PgConnection,
    tenant_id: TenantId,
    applied_ids: &[uuid::Uuid],
    synced_at: DateTime<Utc>,
) -> McpServerRegistryResult<RestartStatus> {
    let raw_tenant = tenant_id.into_inner();
    diesel::delete(
        pending_changes::table
            .filter(pending_changes::tenant_id.eq(raw_tenant))
            .filter(pending_changes::id.eq_any(applied_ids)),
    )
    .execute(tx)?;

    let remaining = load_changes(tx, tenant_id)?;
    let still_queued: Vec<uuid::Uuid> = remaining.iter().map(PendingChange::entity_id).collect();

    diesel::update(
        mcp_servers::table
            .filter(mcp_servers::tenant_id.eq(raw_tenant))
            .filter(mcp_servers::needs_sync.eq(true))
            .filter(diesel::dsl::not(mcp_servers::id.eq_any(&still_queued))),
    )
    .set(mcp_servers::needs_sync.eq(false))
    .execute(tx)?;

    if remaining.is_empty() {
        diesel::insert_into(mcp_sync_state::table)
            .values(&SyncStateRow {
                tenant_id: raw_tenant,
                last_sync_at: synced_at,
            })
            .on_conflict(mcp_sync_state::tenant_id)
            .do_update()
            .set(mcp_sync_state::last_sync_at.eq(excluded(mcp_sync_state::last_sync_at)))
            .execute(tx)?;
    }

    Ok(RestartStatus {
        pending_changes: remaining,
        last_sync_at: load_last_sync(tx, tenant_id)?,
    })
}

fn load_changes(
    connection: &mut PgConnection,
    tenant_id: TenantId,
) -> McpServerRegistryResult<Vec<PendingChange>> {
    let rows = pending_changes::table
        .filter(pending_changes::tenant_id.eq(tenant_id.into_inner()))
        .order(pending_changes::created_at.asc())
        .select(PendingChangeRow::as_select())
        .load::<PendingChangeRow>(connection)?;
    rows.into_iter().map(row_to_change).collect()
}

fn load_last_sync(
    connection: &mut PgConnection,
    tenant_id: TenantId,
) -> McpServerRegistryResult<Option<DateTime<Utc>>> {
    Ok(mcp_sync_state::table
        .filter(mcp_sync_state::tenant_id.eq(tenant_id.into_inner()))
        .select(mcp_sync_state::last_sync_at)
        .first::<DateTime<Utc>>(connection)
        .optional()?)
}

fn store_credentials(
    server: &McpServer,
    cipher: Option<&CredentialCipher>,
) -> McpServerRegistryResult<serde_json::Value> {
    match cipher {
        Some(active) => active
            .seal(server.credentials())
            .map_err(McpServerRegistryError::persistence),
        None => serde_json::to_value(server.credentials())
            .map_err(McpServerRegistryError::persistence),
    }
}

fn load_credentials(
    stored: serde_json::Value,
    cipher: Option<&CredentialCipher>,
) -> McpServerRegistryResult<McpCredentials> {
    let opened = match cipher {
        Some(active) => active.open(stored),
        None if cipher::sealed_payload(&stored).is_some() => Err(CredentialCipherError::MissingKey),
        None => cipher::read_plaintext(stored),
    };
    opened.map_err(McpServerRegistryError::invalid_persisted_data)
}

fn to_new_row(
    server: &McpServer,
    cipher: Option<&CredentialCipher>,
) -> McpServerRegistryResult<NewMcpServerRow> {
    let health = server.health();
    Ok(NewMcpServerRow {
        id: server.id().into_inner(),
        tenant_id: server.tenant_id().into_inner(),
        name: server.name().as_str().to_owned(),
        description: server.description().map(str::to_owned),
        transport: serde_json::to_value(server.transport())
            .map_err(McpServerRegistryError::persistence)?,
        credentials: store_credentials(server, cipher)?,
        is_enabled: server.is_enabled(),
        needs_sync: server.needs_sync(),
        health_status: health.status().as_str().to_owned(),
        health_message: health.message().map(str::to_owned),
        health_checked_at: health.checked_at(),
        created_at: server.created_at(),
        updated_at: server.updated_at(),
    })
}

fn to_changeset(
    server: &McpServer,
    cipher: Option<&CredentialCipher>,
) -> McpServerRegistryResult<McpServerConfigChangeset> {
    Ok(McpServerConfigChangeset {
        name: server.name().as_str().to_owned(),
        description: server.description().map(str::to_owned),
        transport: serde_json::to_value(server.transport())
            .map_err(McpServerRegistryError::persistence)?,
        credentials: store_credentials(server, cipher)?,
        is_enabled: server.is_enabled(),
        needs_sync: server.needs_sync(),
        updated_at: server.updated_at(),
    })
}

fn to_change_row(change: &PendingChange) -> PendingChangeRow {
    PendingChangeRow {
        id: change.id().into_inner(),
        tenant_id: change.tenant_id().into_inner(),
        entity_type: change.entity_type().as_str().to_owned(),
        entity_id: change.entity_id(),
        entity_name: change.entity_name().to_owned(),
        previous_name: change.previous_name().map(str::to_owned),
        kind: change.kind().as_str().to_owned(),
        created_at: change.created_at(),
    }
}

fn row_to_server(
    row: McpServerRow,
    cipher: Option<&CredentialCipher>,
) -> McpServerRegistryResult<McpServer> {
    let McpServerRow {
        id,
        tenant_id,
        name,
        description,
        transport,
        credentials,
        is_enabled,
        needs_sync,
        health_status,
        health_message,
        health_checked_at,
        created_at,
        updated_at,
    } = row;

    let parsed_name =
        McpServerName::new(&name).map_err(McpServerRegistryError::invalid_persisted_data)?;
    let parsed_transport: McpTransport = serde_json::from_value(transport)
        .map_err(McpServerRegistryError::invalid_persisted_data)?;
    let parsed_credentials = load_credentials(credentials, cipher)?;
    let parsed_status = McpServerHealthStatus::try_from(health_status.as_str())
        .map_err(McpServerRegistryError::invalid_persisted_data)?;

    Ok(McpServer::from_persisted(PersistedMcpServerData {
        id: McpServerId::from_uuid(id),
        tenant_id: TenantId::from_uuid(tenant_id),
        name: parsed_name,
        description,
        transport: parsed_transport,
        credentials: parsed_credentials,
        is_enabled,
        needs_sync,
        health: McpServerHealthSnapshot::from_parts(
            parsed_status,
            health_checked_at,
            health_message,
        ),
        created_at,
        updated_at,
    }))
}

fn row_to_change(row: PendingChangeRow) -> McpServerRegistryResult<PendingChange> {
    let entity_type = ChangeEntity::try_from(row.entity_type.as_str())
        .map_err(McpServerRegistryError::invalid_persisted_data)?;
    let kind = ChangeKind::try_from(row.kind.as_str())
        .map_err(McpServerRegistryError::invalid_persisted_data)?;

    Ok(PendingChange::from_persisted(PersistedPendingChangeData {
        id: PendingChangeId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        entity_type,
        entity_id: row.entity_id,
        entity_name: row.entity_name,
        previous_name: row.previous_name,
        kind,
        created_at: row.created_at,
    }))
}

fn is_name_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == TENANT_NAME_INDEX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;

    fn sample_server() -> McpServer {
        let name = McpServerName::new("github").expect("valid server name");
        let transport = McpTransport::http("https://mcp.example.com/rpc").expect("valid transport");
        let credentials = McpCredentials::new([("GITHUB_TOKEN".to_owned(), "ghp_x".to_owned())])
            .expect("valid credentials");
        McpServer::new(TenantId::new(), name, transport, &DefaultClock)
            .with_description(Some("Issues and pull requests".to_owned()))
            .with_credentials(credentials)
    }

    fn stored_row(new_row: NewMcpServerRow) -> McpServerRow {
        McpServerRow {
            id: new_row.id,
            tenant_id: new_row.tenant_id,
            name: new_row.name,
            description: new_row.description,
            transport: new_row.transport,
            credentials: new_row.credentials,
            is_enabled: new_row.is_enabled,
            needs_sync: new_row.needs_sync,
            health_status: new_row.health_status,
            health_message: new_row.health_message,
            health_checked_at: new_row.health_checked_at,
            created_at: new_row.created_at,
            updated_at: new_row.updated_at,
        }
    }

    fn test_cipher() -> CredentialCipher {
        CredentialCipher::from_base64_key("AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=")
            .expect("valid key")
    }

    #[test]
    fn server_rows_round_trip_through_domain() {
        let server = sample_server();
        let new_row = to_new_row(&server, None).expect("server converts to row");

        let restored = row_to_server(stored_row(new_row), None).expect("row converts back");

        assert_eq!(restored, server);
    }

    #[test]
    fn sealed_rows_hide_credentials_and_round_trip() {
        let server = sample_server();
        let cipher = test_cipher();
        let new_row = to_new_row(&server, Some(&cipher)).expect("server converts to row");
        let stored = new_row.credentials.to_string();

        let restored =
            row_to_server(stored_row(new_row), Some(&cipher)).expect("row converts back");

        assert!(!stored.contains("ghp_x"));
        assert!(!stored.contains("GITHUB_TOKEN"));
        assert_eq!(restored, server);
    }

    #[test]
    fn plaintext_rows_stay_readable_once_a_key_is_configured() {
        let server = sample_server();
        let new_row = to_new_row(&server, None).expect("server converts to row");

        let restored =
            row_to_server(stored_row(new_row), Some(&test_cipher())).expect("row converts back");

        assert_eq!(restored.credentials(), server.credentials());
    }

    #[test]
    fn sealed_rows_without_a_key_are_invalid_persisted_data() {
        let server = sample_server();
        let new_row = to_new_row(&server, Some(&test_cipher())).expect("server converts to row");

        assert!(matches!(
            row_to_server(stored_row(new_row), None),
            Err(McpServerRegistryError::InvalidPersistedData(_))
        ));
    }

    #[test]
    fn corrupt_health_status_is_invalid_persisted_data() {
        let server = sample_server();
        let new_row = to_new_row(&server, None).expect("server converts to row");
        let row = McpServerRow {
            health_status: "degraded".to_owned(),
            ..stored_row(new_row)
        };

        assert!(matches!(
            row_to_server(row, None),
            Err(McpServerRegistryError::InvalidPersistedData(_))
        ));
    }

    #[test]
    fn sync_lock_keys_are_scoped_per_tenant() {
        let first = TenantId::new();
        let second = TenantId::new();

        assert_eq!(sync_lock_key(first), sync_lock_key(first));
        assert_ne!(sync_lock_key(first), sync_lock_key(second));
        assert!(sync_lock_key(first).starts_with(SYNC_LOCK_PREFIX));
    }

    #[test]
    fn change_rows_keep_previous_name() {
        let server = sample_server();
        let change = PendingChange::for_server(&server, ChangeKind::Update, &DefaultClock)
            .with_previous_name("octocat");

        let restored = row_to_change(to_change_row(&change)).expect("row converts back");

        assert_eq!(restored, change);
    }
}
