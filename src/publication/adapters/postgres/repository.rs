//! `PostgreSQL` repository implementation for agent components.
//!
//! Exclusive publication runs in a `SERIALIZABLE` transaction. The partial
//! unique index `idx_agent_components_one_published` on `(tenant_id) WHERE
//! is_published` backs the invariant at the storage level; a violation or a
//! serialization failure surfaces as
//! [`AgentComponentRepositoryError::Conflict`].

use super::{
    models::{AgentComponentRow, NewAgentComponentRow},
    schema::agent_components,
};
use crate::publication::{
    domain::{
        AgentComponent, AgentComponentId, AgentPersona, PersistedAgentComponentData,
        PublishOutcome, UnpublishOutcome,
    },
    ports::{
        AgentComponentRepository, AgentComponentRepositoryError, AgentComponentRepositoryResult,
    },
};
use crate::tenant::TenantId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type for agent component adapters.
pub type AgentComponentPgPool = Pool<ConnectionManager<PgConnection>>;

const LIVE_AGENT_INDEX: &str = "idx_agent_components_one_published";

/// `PostgreSQL`-backed agent component repository.
#[derive(Debug, Clone)]
pub struct PostgresAgentComponentRepository {
    pool: AgentComponentPgPool,
}

impl PostgresAgentComponentRepository {
    /// Creates a new repository from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: AgentComponentPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> AgentComponentRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AgentComponentRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(AgentComponentRepositoryError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(AgentComponentRepositoryError::persistence)?
    }
}

impl From<DieselError> for AgentComponentRepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                Self::Conflict
            }
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                if is_live_agent_violation(info.as_ref()) =>
            {
                Self::Conflict
            }
            other => Self::persistence(other),
        }
    }
}

#[async_trait]
impl AgentComponentRepository for PostgresAgentComponentRepository {
    async fn store(&self, agent: &AgentComponent) -> AgentComponentRepositoryResult<()> {
        let agent_id = agent.id();
        let new_row = to_new_row(agent);

        self.run_blocking(move |connection| {
            diesel::insert_into(agent_components::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_live_agent_violation(info.as_ref()) =>
                    {
                        AgentComponentRepositoryError::Conflict
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AgentComponentRepositoryError::DuplicateAgent(agent_id)
                    }
                    _ => AgentComponentRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        agent_id: AgentComponentId,
    ) -> AgentComponentRepositoryResult<Option<AgentComponent>> {
        self.run_blocking(move |connection| {
            find_row(connection, agent_id.into_inner())?
                .map(row_to_agent)
                .transpose()
        })
        .await
    }

    async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> AgentComponentRepositoryResult<Vec<AgentComponent>> {
        self.run_blocking(move |connection| {
            let rows = agent_components::table
                .filter(agent_components::tenant_id.eq(tenant_id.into_inner()))
                .order(agent_components::created_at.asc())
                .select(AgentComponentRow::as_select())
                .load::<AgentComponentRow>(connection)
                .map_err(AgentComponentRepositoryError::persistence)?;
            rows.into_iter().map(row_to_agent).collect()
        })
        .await
    }

    async fn find_published(
        &self,
        tenant_id: TenantId,
    ) -> AgentComponentRepositoryResult<Option<AgentComponent>> {
        self.run_blocking(move |connection| {
            let row = agent_components::table
                .filter(agent_components::tenant_id.eq(tenant_id.into_inner()))
                .filter(agent_components::is_published.eq(true))
                .select(AgentComponentRow::as_select())
                .first::<AgentComponentRow>(connection)
                .optional()
                .map_err(AgentComponentRepositoryError::persistence)?;
            row.map(row_to_agent).transpose()
        })
        .await
    }

    async fn publish_exclusive(
        &self,
        agent_id: AgentComponentId,
        published_at: DateTime<Utc>,
    ) -> AgentComponentRepositoryResult<PublishOutcome> {
        self.run_blocking(move |connection| {
            connection
                .build_transaction()
                .serializable()
                .run::<_, AgentComponentRepositoryError, _>(|tx| {
                    publish_in_transaction(tx, agent_id, published_at)
                })
        })
        .await
    }

    async fn unpublish(
        &self,
        agent_id: AgentComponentId,
        unpublished_at: DateTime<Utc>,
    ) -> AgentComponentRepositoryResult<UnpublishOutcome> {
        let raw_id = agent_id.into_inner();
        self.run_blocking(move |connection| {
            let demoted = diesel::update(
                agent_components::table
                    .filter(agent_components::id.eq(raw_id))
                    .filter(agent_components::is_published.eq(true)),
            )
            .set((
                agent_components::is_published.eq(false),
                agent_components::published_at.eq(None::<DateTime<Utc>>),
                agent_components::updated_at.eq(unpublished_at),
            ))
            .returning(AgentComponentRow::as_returning())
            .get_result::<AgentComponentRow>(connection)
            .optional()
            .map_err(AgentComponentRepositoryError::persistence)?;

            if let Some(row) = demoted {
                return Ok(UnpublishOutcome::new(row_to_agent(row)?, true));
            }

            let row = find_row(connection, raw_id)?
                .ok_or(AgentComponentRepositoryError::NotFound(agent_id))?;
            Ok(UnpublishOutcome::new(row_to_agent(row)?, false))
        })
        .await
    }
}

fn publish_in_transaction(
    tx: &mut PgConnection,
    agent_id: AgentComponentId,
    published_at: DateTime<Utc>,
) -> AgentComponentRepositoryResult<PublishOutcome> {
    let raw_id = agent_id.into_inner();
    let target = agent_components::table
        .filter(agent_components::id.eq(raw_id))
        .select(AgentComponentRow::as_select())
        .for_update()
        .first::<AgentComponentRow>(tx)
        .optional()?
        .ok_or(AgentComponentRepositoryError::NotFound(agent_id))?;

    let demoted: Vec<uuid::Uuid> = diesel::update(
        agent_components::table
            .filter(agent_components::tenant_id.eq(target.tenant_id))
            .filter(agent_components::is_published.eq(true))
            .filter(agent_components::id.ne(raw_id)),
    )
    .set((
        agent_components::is_published.eq(false),
        agent_components::published_at.eq(None::<DateTime<Utc>>),
        agent_components::updated_at.eq(published_at),
    ))
    .returning(agent_components::id)
    .get_results(tx)?;

    let published = if target.is_published {
        target
    } else {
        diesel::update(agent_components::table.filter(agent_components::id.eq(raw_id)))
            .set((
                agent_components::is_published.eq(true),
                agent_components::published_at.eq(Some(published_at)),
                agent_components::updated_at.eq(published_at),
            ))
            .returning(AgentComponentRow::as_returning())
            .get_result::<AgentComponentRow>(tx)?
    };

    Ok(PublishOutcome::new(
        row_to_agent(published)?,
        demoted.into_iter().map(AgentComponentId::from_uuid).collect(),
    ))
}

fn find_row(
    connection: &mut PgConnection,
    raw_id: uuid::Uuid,
) -> AgentComponentRepositoryResult<Option<AgentComponentRow>> {
    agent_components::table
        .filter(agent_components::id.eq(raw_id))
        .select(AgentComponentRow::as_select())
        .first::<AgentComponentRow>(connection)
        .optional()
        .map_err(AgentComponentRepositoryError::persistence)
}

fn to_new_row(agent: &AgentComponent) -> NewAgentComponentRow {
    let persona = agent.persona();
    NewAgentComponentRow {
        id: agent.id().into_inner(),
        tenant_id: agent.tenant_id().into_inner(),
        name: persona.name().to_owned(),
        description: persona.description().map(str::to_owned),
        qa_who: persona.qa_who().map(str::to_owned),
        qa_rules: persona.qa_rules().map(str::to_owned),
        is_published: agent.is_published(),
        published_at: agent.published_at(),
        created_at: agent.created_at(),
        updated_at: agent.updated_at(),
    }
}

fn row_to_agent(row: AgentComponentRow) -> AgentComponentRepositoryResult<AgentComponent> {
    let AgentComponentRow {
        id,
        tenant_id,
        name,
        description,
        qa_who,
        qa_rules,
        is_published,
        published_at,
        created_at,
        updated_at,
    } = row;

    let persona = AgentPersona::new(name)
        .map_err(AgentComponentRepositoryError::invalid_persisted_data)?
        .with_description(description)
        .with_qa_who(qa_who)
        .with_qa_rules(qa_rules);

    Ok(AgentComponent::from_persisted(PersistedAgentComponentData {
        id: AgentComponentId::from_uuid(id),
        tenant_id: TenantId::from_uuid(tenant_id),
        persona,
        is_published,
        published_at,
        created_at,
        updated_at,
    }))
}

fn is_live_agent_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == LIVE_AGENT_INDEX)
}
