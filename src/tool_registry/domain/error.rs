//! Error types for MCP server domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing tool registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolRegistryDomainError {
    /// The server name is empty after trimming.
    #[error("MCP server name must not be empty")]
    EmptyServerName,

    /// The server name contains characters outside `[a-z0-9_-]`.
    #[error(
        "MCP server name '{0}' contains invalid characters (only lowercase alphanumeric, hyphens and underscores allowed)"
    )]
    InvalidServerName(String),

    /// The server name exceeds the 100-character storage limit.
    #[error("MCP server name exceeds 100 character limit: {0}")]
    ServerNameTooLong(String),

    /// The stdio command is empty.
    #[error("stdio command must not be empty")]
    EmptyStdioCommand,

    /// The stdio command name contains characters that are never allowed.
    #[error("stdio command '{0}' has an invalid executable name")]
    InvalidStdioCommand(String),

    /// The stdio command is not on the executable allowlist.
    #[error("stdio command '{0}' is not an allowed MCP server executable")]
    CommandNotAllowed(String),

    /// An environment variable name is malformed.
    #[error("environment variable name '{0}' is invalid")]
    InvalidEnvVarName(String),

    /// An environment variable may not be overridden by server configuration.
    #[error("environment variable '{0}' cannot be set for MCP servers")]
    BlockedEnvVar(String),

    /// The remote URL is empty.
    #[error("remote MCP server URL must not be empty")]
    EmptyRemoteUrl,

    /// The remote URL is malformed or uses an unsupported scheme.
    #[error("remote MCP server URL '{url}' is invalid: {reason}")]
    InvalidRemoteUrl {
        /// Rejected URL.
        url: String,
        /// Why the URL was rejected.
        reason: String,
    },

    /// The remote URL points at an internal or private address.
    #[error("remote MCP server host '{0}' is not reachable from this service")]
    BlockedRemoteHost(String),

    /// No built-in template has the requested key.
    #[error("unknown MCP server template: {0}")]
    UnknownTemplate(String),

    /// A template field marked required was not supplied.
    #[error("template '{template}' requires '{field}'")]
    MissingTemplateField {
        /// Template key.
        template: String,
        /// Missing environment or credential key.
        field: String,
    },
}

/// Error returned while parsing health status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown MCP server health status: {0}")]
pub struct ParseMcpServerHealthStatusError(pub String);

/// Error returned while parsing a pending change kind from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown pending change kind: {0}")]
pub struct ParseChangeKindError(pub String);

/// Error returned while parsing a pending change entity type from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown pending change entity type: {0}")]
pub struct ParseChangeEntityError(pub String);
