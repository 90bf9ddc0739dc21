//! Built-in MCP server templates.

use super::{McpCredentials, McpTransport, StdioTransportConfig, ToolRegistryDomainError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Environment or credential key a template understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateField {
    /// Variable name.
    pub key: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Whether the server cannot start without it.
    pub required: bool,
    /// Whether the value belongs in credentials rather than plain env.
    pub secret: bool,
}

/// Predefined stdio server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct McpServerTemplate {
    /// Template key, also the default server name.
    pub key: &'static str,
    /// Display name.
    pub display_name: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Executable launched for the server.
    pub command: &'static str,
    /// Fixed arguments.
    pub args: &'static [&'static str],
    /// Known environment fields.
    pub fields: &'static [TemplateField],
}

/// Templates offered by the registry.
pub const TEMPLATES: &[McpServerTemplate] = &[
    McpServerTemplate {
        key: "postgres",
        display_name: "PostgreSQL Database",
        description: "Query PostgreSQL databases",
        command: "npx",
        args: &["-y", "@modelcontextprotocol/server-postgres"],
        fields: &[TemplateField {
            key: "POSTGRES_URL",
            description: "PostgreSQL connection URL",
            required: true,
            secret: true,
        }],
    },
    McpServerTemplate {
        key: "sqlite",
        display_name: "SQLite Database",
        description: "Query SQLite databases",
        command: "npx",
        args: &["-y", "@modelcontextprotocol/server-sqlite"],
        fields: &[TemplateField {
            key: "DATABASE_PATH",
            description: "Path to SQLite database file",
            required: true,
            secret: false,
        }],
    },
    McpServerTemplate {
        key: "playwright",
        display_name: "Playwright Browser",
        description: "Browser automation and web scraping",
        command: "npx",
        args: &["-y", "@modelcontextprotocol/server-playwright"],
        fields: &[],
    },
    McpServerTemplate {
        key: "filesystem",
        display_name: "File System",
        description: "Read and write files",
        command: "npx",
        args: &["-y", "@modelcontextprotocol/server-filesystem"],
        fields: &[TemplateField {
            key: "ALLOWED_PATHS",
            description: "Allowed file paths",
            required: true,
            secret: false,
        }],
    },
    McpServerTemplate {
        key: "git",
        display_name: "Git Operations",
        description: "Programmatic git operations",
        command: "npx",
        args: &["-y", "@modelcontextprotocol/server-git"],
        fields: &[],
    },
];

/// Looks up a built-in template.
///
/// # Errors
///
/// Returns [`ToolRegistryDomainError::UnknownTemplate`] for unknown keys.
pub fn find_template(key: &str) -> Result<&'static McpServerTemplate, ToolRegistryDomainError> {
    TEMPLATES
        .iter()
        .find(|template| template.key == key)
        .ok_or_else(|| ToolRegistryDomainError::UnknownTemplate(key.to_owned()))
}

impl McpServerTemplate {
    /// Builds the stdio transport for this template.
    ///
    /// Every required field must be supplied through `env` or `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::MissingTemplateField`] when a
    /// required field is absent, or validation errors for `env`.
    pub fn instantiate(
        &self,
        env: BTreeMap<String, String>,
        credentials: &McpCredentials,
    ) -> Result<McpTransport, ToolRegistryDomainError> {
        let missing = self.fields.iter().find(|field| {
            field.required
                && !credentials.contains_key(field.key)
                && env.get(field.key).is_none_or(|value| value.trim().is_empty())
        });
        if let Some(field) = missing {
            return Err(ToolRegistryDomainError::MissingTemplateField {
                template: self.key.to_owned(),
                field: field.key.to_owned(),
            });
        }

        let config = StdioTransportConfig::new(self.command)?
            .with_args(self.args.iter().map(|arg| (*arg).to_owned()))
            .with_env(env)?;
        Ok(McpTransport::Stdio(config))
    }
}
