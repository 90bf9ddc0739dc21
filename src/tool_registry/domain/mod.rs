//! Domain model for tenant MCP server configuration.
//!
//! Servers are validated on construction, every configuration change is
//! recorded as a [`PendingChange`], and the restart status is a projection of
//! that queue. Health is observed state and sits beside, not inside, the
//! change log.

mod change;
mod credentials;
mod error;
mod health;
mod ids;
mod restart;
mod server;
mod template;
mod transport;
pub mod validation;

pub use change::{ChangeEntity, ChangeKind, PendingChange, PersistedPendingChangeData};
pub use credentials::McpCredentials;
pub use error::{
    ParseChangeEntityError, ParseChangeKindError, ParseMcpServerHealthStatusError,
    ToolRegistryDomainError,
};
pub use health::{McpServerHealthSnapshot, McpServerHealthStatus};
pub use ids::{McpServerId, McpServerName, PendingChangeId};
pub use restart::{FailedChange, RestartStatus, SyncReport};
pub use server::{McpServer, McpServerUpdate, PersistedMcpServerData};
pub use template::{McpServerTemplate, TEMPLATES, TemplateField, find_template};
pub use transport::{McpTransport, McpTransportKind, RemoteTransportConfig, StdioTransportConfig};
