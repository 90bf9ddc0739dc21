//! Service layer for tenant MCP server configuration.

use crate::tenant::TenantId;
use crate::tool_registry::{
    domain::{
        ChangeKind, McpCredentials, McpServer, McpServerId, McpServerName, McpServerTemplate,
        McpServerUpdate, McpTransport, PendingChange, TEMPLATES, ToolRegistryDomainError,
        find_template,
    },
    ports::{McpServerRegistryError, McpServerRegistryRepository},
};
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for registering an MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMcpServerRequest {
    /// Server name, unique per tenant.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Transport configuration.
    pub transport: McpTransport,
    /// Secret environment values.
    pub credentials: BTreeMap<String, String>,
    /// Whether the server starts enabled.
    pub is_enabled: bool,
}

impl CreateMcpServerRequest {
    /// Creates a request for an enabled server without credentials.
    #[must_use]
    pub fn new(name: impl Into<String>, transport: McpTransport) -> Self {
        Self {
            name: name.into(),
            description: None,
            transport,
            credentials: BTreeMap::new(),
            is_enabled: true,
        }
    }
}

/// Request payload for instantiating a built-in template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateFromTemplateRequest {
    /// Template key.
    pub template: String,
    /// Server name; defaults to the template key.
    pub name: Option<String>,
    /// Optional description; defaults to the template description.
    pub description: Option<String>,
    /// Plain environment values.
    pub env: BTreeMap<String, String>,
    /// Secret environment values.
    pub credentials: BTreeMap<String, String>,
}

/// Partial update of a server. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateMcpServerRequest {
    /// New name.
    pub name: Option<String>,
    /// New description; blank clears it.
    pub description: Option<String>,
    /// New transport configuration.
    pub transport: Option<McpTransport>,
    /// Replacement credentials.
    pub credentials: Option<BTreeMap<String, String>>,
    /// New enabled flag.
    pub is_enabled: Option<bool>,
}

/// Name given to unsaved servers built for a connection test.
pub const CONNECTION_TEST_NAME: &str = "connection-test";

/// Service-level errors for MCP server registry operations.
#[derive(Debug, Error)]
pub enum McpServerRegistryServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ToolRegistryDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] McpServerRegistryError),
    /// No server with the given identifier exists for the tenant.
    #[error("MCP server {0} not found")]
    NotFound(McpServerId),
}

/// Result type for registry service operations.
pub type McpServerRegistryServiceResult<T> = Result<T, McpServerRegistryServiceError>;

/// MCP server registry service.
///
/// Every mutation marks the server as needing a sync and queues a
/// [`PendingChange`] in the same repository write.
pub struct McpServerRegistryService<R, C>
where
    R: McpServerRegistryRepository + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> McpServerRegistryService<R, C>
where
    R: McpServerRegistryRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new registry service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    async fn find_owned_or_error(
        &self,
        tenant_id: TenantId,
        server_id: McpServerId,
    ) -> McpServerRegistryServiceResult<McpServer> {
        self.repository
            .find_by_id(server_id)
            .await?
            .filter(|server| server.tenant_id() == tenant_id)
            .ok_or(McpServerRegistryServiceError::NotFound(server_id))
    }

    async fn register(&self, server: McpServer) -> McpServerRegistryServiceResult<McpServer> {
        let change = PendingChange::for_server(&server, ChangeKind::Create, &*self.clock);
        self.repository.register(&server, &change).await?;
        tracing::info!(
            tenant_id = %server.tenant_id(),
            server_id = %server.id(),
            server = %server.name(),
            transport = %server.transport().kind(),
            "MCP server registered"
        );
        Ok(server)
    }

    /// Registers a server.
    ///
    /// # Errors
    ///
    /// Returns domain errors for invalid names, commands, URLs or environment
    /// variables, and [`McpServerRegistryError::DuplicateServerName`] when the
    /// tenant already uses the name.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        request: CreateMcpServerRequest,
    ) -> McpServerRegistryServiceResult<McpServer> {
        let name = McpServerName::new(request.name)?;
        let transport = request.transport.sanitize()?;
        let credentials = McpCredentials::new(request.credentials)?;
        let server = McpServer::new(tenant_id, name, transport, &*self.clock)
            .with_description(request.description)
            .with_credentials(credentials)
            .with_enabled(request.is_enabled);
        self.register(server).await
    }

    /// Validates a transport and credentials without storing anything.
    ///
    /// The returned server is never registered and queues no change; it
    /// exists only to be handed to a health probe.
    ///
    /// # Errors
    ///
    /// Returns domain errors for invalid commands, URLs or environment
    /// variables.
    pub fn draft_for_connection_test(
        &self,
        tenant_id: TenantId,
        transport: McpTransport,
        credentials: BTreeMap<String, String>,
    ) -> McpServerRegistryServiceResult<McpServer> {
        let name = McpServerName::new(CONNECTION_TEST_NAME)?;
        let sanitized = transport.sanitize()?;
        let secrets = McpCredentials::new(credentials)?;
        Ok(McpServer::new(tenant_id, name, sanitized, &*self.clock).with_credentials(secrets))
    }

    /// Registers a server from a built-in template.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::UnknownTemplate`] or
    /// [`ToolRegistryDomainError::MissingTemplateField`] for bad template
    /// input, plus the errors of [`Self::create`].
    pub async fn create_from_template(
        &self,
        tenant_id: TenantId,
        request: CreateFromTemplateRequest,
    ) -> McpServerRegistryServiceResult<McpServer> {
        let template = find_template(&request.template)?;
        let credentials = McpCredentials::new(request.credentials)?;
        let transport = template.instantiate(request.env, &credentials)?;
        let name = McpServerName::new(request.name.unwrap_or_else(|| template.key.to_owned()))?;
        let description = request
            .description
            .or_else(|| Some(template.description.to_owned()));
        let server = McpServer::new(tenant_id, name, transport, &*self.clock)
            .with_description(description)
            .with_credentials(credentials);
        self.register(server).await
    }

    /// Returns the built-in templates.
    #[must_use]
    pub const fn templates(&self) -> &'static [McpServerTemplate] {
        TEMPLATES
    }

    /// Returns a server owned by the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryServiceError::NotFound`] when the server does
    /// not exist for the tenant.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        server_id: McpServerId,
    ) -> McpServerRegistryServiceResult<McpServer> {
        self.find_owned_or_error(tenant_id, server_id).await
    }

    /// Lists the tenant's servers ordered by name.
    ///
    /// # Errors
    ///
    /// Returns persistence-layer errors from the repository.
    pub async fn list(&self, tenant_id: TenantId) -> McpServerRegistryServiceResult<Vec<McpServer>> {
        Ok(self.repository.list_by_tenant(tenant_id).await?)
    }

    /// Applies a partial update.
    ///
    /// An update that changes nothing is not queued.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryServiceError::NotFound`] for unknown
    /// servers, domain errors for invalid fields, and repository errors.
    pub async fn update(
        &self,
        tenant_id: TenantId,
        server_id: McpServerId,
        request: UpdateMcpServerRequest,
    ) -> McpServerRegistryServiceResult<McpServer> {
        let update = McpServerUpdate {
            name: request.name.map(McpServerName::new).transpose()?,
            description: request.description,
            transport: request.transport.map(McpTransport::sanitize).transpose()?,
            credentials: request.credentials.map(McpCredentials::new).transpose()?,
            is_enabled: request.is_enabled,
        };

        let mut server = self.find_owned_or_error(tenant_id, server_id).await?;
        let previous_name = server.name().as_str().to_owned();
        let Some(kind) = server.apply_update(update, &*self.clock) else {
            return Ok(server);
        };

        let change = PendingChange::for_server(&server, kind, &*self.clock)
            .with_previous_name(&previous_name);
        self.repository.update(&server, &change).await?;
        tracing::info!(
            tenant_id = %tenant_id,
            server_id = %server_id,
            server = %server.name(),
            change = %kind,
            "MCP server updated"
        );
        Ok(server)
    }

    /// Enables a server.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryServiceError::NotFound`] for unknown
    /// servers and repository errors.
    pub async fn enable(
        &self,
        tenant_id: TenantId,
        server_id: McpServerId,
    ) -> McpServerRegistryServiceResult<McpServer> {
        self.set_enabled(tenant_id, server_id, true).await
    }

    /// Disables a server.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryServiceError::NotFound`] for unknown
    /// servers and repository errors.
    pub async fn disable(
        &self,
        tenant_id: TenantId,
        server_id: McpServerId,
    ) -> McpServerRegistryServiceResult<McpServer> {
        self.set_enabled(tenant_id, server_id, false).await
    }

    async fn set_enabled(
        &self,
        tenant_id: TenantId,
        server_id: McpServerId,
        enabled: bool,
    ) -> McpServerRegistryServiceResult<McpServer> {
        let mut server = self.find_owned_or_error(tenant_id, server_id).await?;
        let kind = if enabled {
            server.enable(&*self.clock);
            ChangeKind::Enable
        } else {
            server.disable(&*self.clock);
            ChangeKind::Disable
        };

        let change = PendingChange::for_server(&server, kind, &*self.clock);
        self.repository.update(&server, &change).await?;
        tracing::info!(
            tenant_id = %tenant_id,
            server_id = %server_id,
            server = %server.name(),
            change = %kind,
            "MCP server toggled"
        );
        Ok(server)
    }

    /// Deletes a server.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryServiceError::NotFound`] for unknown
    /// servers and repository errors.
    pub async fn delete(
        &self,
        tenant_id: TenantId,
        server_id: McpServerId,
    ) -> McpServerRegistryServiceResult<()> {
        let server = self.find_owned_or_error(tenant_id, server_id).await?;
        let change = PendingChange::for_server(&server, ChangeKind::Delete, &*self.clock);
        self.repository
            .delete(server_id, &change)
            .await
            .map_err(|err| match err {
                McpServerRegistryError::NotFound(_) => {
                    McpServerRegistryServiceError::NotFound(server_id)
                }
                other => other.into(),
            })?;
        tracing::info!(
            tenant_id = %tenant_id,
            server_id = %server_id,
            server = %server.name(),
            "MCP server deleted"
        );
        Ok(())
    }
}
