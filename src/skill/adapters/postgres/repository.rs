//! `PostgreSQL` repository implementation for workflows.

use super::{
    models::{NewWorkflowRow, WorkflowRow},
    schema::workflows,
};
use crate::publication::domain::AgentComponentId;
use crate::skill::{
    domain::{PersistedWorkflowData, Workflow, WorkflowId, WorkflowName},
    ports::{WorkflowRepository, WorkflowRepositoryError, WorkflowRepositoryResult},
};
use crate::tenant::TenantId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type for workflow adapters.
pub type WorkflowPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed workflow repository.
#[derive(Debug, Clone)]
pub struct PostgresWorkflowRepository {
    pool: WorkflowPgPool,
}

impl PostgresWorkflowRepository {
    /// Creates a new repository from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: WorkflowPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> WorkflowRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkflowRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkflowRepositoryError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(WorkflowRepositoryError::persistence)?
    }
}

#[async_trait]
impl WorkflowRepository for PostgresWorkflowRepository {
    async fn store(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()> {
        let workflow_id = workflow.id();
        let new_row = to_new_row(workflow);

        self.run_blocking(move |connection| {
            diesel::insert_into(workflows::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        WorkflowRepositoryError::DuplicateWorkflow(workflow_id)
                    }
                    _ => WorkflowRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, workflow: &Workflow) -> WorkflowRepositoryResult<()> {
        let workflow_id = workflow.id();
        let row = to_new_row(workflow);

        self.run_blocking(move |connection| {
            let updated_count =
                diesel::update(workflows::table.filter(workflows::id.eq(row.id)))
                    .set((
                        workflows::name.eq(&row.name),
                        workflows::description.eq(&row.description),
                        workflows::is_active.eq(row.is_active),
                        workflows::is_agent_skill.eq(row.is_agent_skill),
                        workflows::agent_component_ids.eq(&row.agent_component_ids),
                        workflows::updated_at.eq(row.updated_at),
                    ))
                    .execute(connection)
                    .map_err(WorkflowRepositoryError::persistence)?;

            if updated_count == 0 {
                return Err(WorkflowRepositoryError::NotFound(workflow_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        workflow_id: WorkflowId,
    ) -> WorkflowRepositoryResult<Option<Workflow>> {
        self.run_blocking(move |connection| {
            let row = workflows::table
                .filter(workflows::id.eq(workflow_id.into_inner()))
                .select(WorkflowRow::as_select())
                .first::<WorkflowRow>(connection)
                .optional()
                .map_err(WorkflowRepositoryError::persistence)?;
            row.map(row_to_workflow).transpose()
        })
        .await
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> WorkflowRepositoryResult<Vec<Workflow>> {
        let raw_tenant = tenant_id.into_inner();
        self.run_blocking(move |connection| {
            let rows = workflows::table
                .filter(workflows::tenant_id.eq(raw_tenant))
                .order(workflows::created_at.asc())
                .select(WorkflowRow::as_select())
                .load::<WorkflowRow>(connection)
                .map_err(WorkflowRepositoryError::persistence)?;
            rows.into_iter().map(row_to_workflow).collect()
        })
        .await
    }

    async fn list_skills(&self, tenant_id: TenantId) -> WorkflowRepositoryResult<Vec<Workflow>> {
        let raw_tenant = tenant_id.into_inner();
        self.run_blocking(move |connection| {
            let rows = workflows::table
                .filter(workflows::tenant_id.eq(raw_tenant))
                .filter(workflows::is_agent_skill.eq(true))
                .filter(workflows::is_active.eq(true))
                .order(workflows::created_at.asc())
                .select(WorkflowRow::as_select())
                .load::<WorkflowRow>(connection)
                .map_err(WorkflowRepositoryError::persistence)?;
            rows.into_iter().map(row_to_workflow).collect()
        })
        .await
    }
}

fn to_new_row(workflow: &Workflow) -> NewWorkflowRow {
    NewWorkflowRow {
        id: workflow.id().into_inner(),
        tenant_id: workflow.tenant_id().into_inner(),
        name: workflow.name().as_str().to_owned(),
        description: workflow.description().map(str::to_owned),
        is_active: workflow.is_active(),
        is_agent_skill: workflow.is_agent_skill(),
        agent_component_ids: workflow
            .agent_component_ids()
            .iter()
            .map(|id| id.into_inner())
            .collect(),
        created_at: workflow.created_at(),
        updated_at: workflow.updated_at(),
    }
}

fn row_to_workflow(row: WorkflowRow) -> WorkflowRepositoryResult<Workflow> {
    let WorkflowRow {
        id,
        tenant_id,
        name,
        description,
        is_active,
        is_agent_skill,
        agent_component_ids,
        created_at,
        updated_at,
    } = row;

    let parsed_name =
        WorkflowName::new(name).map_err(WorkflowRepositoryError::invalid_persisted_data)?;

    Ok(Workflow::from_persisted(PersistedWorkflowData {
        id: WorkflowId::from_uuid(id),
        tenant_id: TenantId::from_uuid(tenant_id),
        name: parsed_name,
        description,
        is_active,
        is_agent_skill,
        agent_component_ids: agent_component_ids
            .into_iter()
            .map(AgentComponentId::from_uuid)
            .collect(),
        created_at,
        updated_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;

    #[test]
    fn agent_links_survive_row_conversion() {
        let agent_id = AgentComponentId::new();
        let workflow = Workflow::new(
            TenantId::new(),
            WorkflowName::new("Grade Essay").expect("valid name"),
            &DefaultClock,
        )
        .with_agent_components([agent_id]);

        let new_row = to_new_row(&workflow);
        let row = WorkflowRow {
            id: new_row.id,
            tenant_id: new_row.tenant_id,
            name: new_row.name,
            description: new_row.description,
            is_active: new_row.is_active,
            is_agent_skill: new_row.is_agent_skill,
            agent_component_ids: new_row.agent_component_ids,
            created_at: new_row.created_at,
            updated_at: new_row.updated_at,
        };

        let restored = row_to_workflow(row).expect("row should convert");
        assert_eq!(restored, workflow);
        assert!(restored.agent_component_ids().contains(&agent_id));
    }
}
