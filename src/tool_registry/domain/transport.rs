//! MCP server transport configuration value objects.

use super::{
    ToolRegistryDomainError,
    validation::{sanitize_env_var, validate_command, validate_remote_url},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Transport settings for an MCP server launched as a child process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdioTransportConfig {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

impl StdioTransportConfig {
    /// Creates a stdio transport configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when the command is empty, malformed
    /// or not on the allowlist.
    pub fn new(command: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        let normalized_command = command.into().trim().to_owned();
        validate_command(&normalized_command)?;

        Ok(Self {
            command: normalized_command,
            args: Vec::new(),
            env: BTreeMap::new(),
        })
    }

    /// Replaces command-line arguments.
    #[must_use]
    pub fn with_args(mut self, values: impl IntoIterator<Item = String>) -> Self {
        self.args = values.into_iter().collect();
        self
    }

    /// Replaces process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when a variable name is malformed
    /// or blocked.
    pub fn with_env(
        mut self,
        values: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ToolRegistryDomainError> {
        self.env = sanitize_env(values)?;
        Ok(self)
    }

    /// Returns the executable command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns command-line arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns environment variables.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    fn sanitize(self) -> Result<Self, ToolRegistryDomainError> {
        let Self { command, args, env } = self;
        Ok(Self::new(command)?.with_args(args).with_env(env)?)
    }
}

/// Transport settings for an MCP server reached over the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTransportConfig {
    url: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default = "default_ssl_verify")]
    ssl_verify: bool,
}

const fn default_ssl_verify() -> bool {
    true
}

impl RemoteTransportConfig {
    /// Creates a remote transport configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when the URL is malformed, not
    /// `http`/`https`, or points at an internal host.
    pub fn new(url: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        let normalized_url = url.into().trim().to_owned();
        validate_remote_url(&normalized_url)?;

        Ok(Self {
            url: normalized_url,
            headers: BTreeMap::new(),
            ssl_verify: true,
        })
    }

    /// Replaces request headers sent to the server.
    #[must_use]
    pub fn with_headers(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers = values.into_iter().collect();
        self
    }

    /// Sets whether TLS certificates are verified.
    #[must_use]
    pub const fn with_ssl_verify(mut self, ssl_verify: bool) -> Self {
        self.ssl_verify = ssl_verify;
        self
    }

    /// Returns the server URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns request headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Returns whether TLS certificates are verified.
    #[must_use]
    pub const fn ssl_verify(&self) -> bool {
        self.ssl_verify
    }

    fn sanitize(self) -> Result<Self, ToolRegistryDomainError> {
        let Self {
            url,
            headers,
            ssl_verify,
        } = self;
        Ok(Self::new(url)?
            .with_headers(headers)
            .with_ssl_verify(ssl_verify))
    }
}

/// Supported MCP transport configuration variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "config")]
pub enum McpTransport {
    /// MCP over local process stdio.
    Stdio(StdioTransportConfig),
    /// MCP over server-sent events.
    Sse(RemoteTransportConfig),
    /// MCP over streamable HTTP.
    Http(RemoteTransportConfig),
}

impl McpTransport {
    /// Creates a `stdio` transport.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`StdioTransportConfig::new`].
    pub fn stdio(command: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        Ok(Self::Stdio(StdioTransportConfig::new(command)?))
    }

    /// Creates an `sse` transport.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`RemoteTransportConfig::new`].
    pub fn sse(url: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        Ok(Self::Sse(RemoteTransportConfig::new(url)?))
    }

    /// Creates an `http` transport.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`RemoteTransportConfig::new`].
    pub fn http(url: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        Ok(Self::Http(RemoteTransportConfig::new(url)?))
    }

    /// Returns the transport kind.
    #[must_use]
    pub const fn kind(&self) -> McpTransportKind {
        match self {
            Self::Stdio(_) => McpTransportKind::Stdio,
            Self::Sse(_) => McpTransportKind::Sse,
            Self::Http(_) => McpTransportKind::Http,
        }
    }

    /// Re-applies every admission rule to a transport that did not come
    /// through the validating constructors (for example, one deserialized
    /// from a request body).
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn sanitize(self) -> Result<Self, ToolRegistryDomainError> {
        Ok(match self {
            Self::Stdio(config) => Self::Stdio(config.sanitize()?),
            Self::Sse(config) => Self::Sse(config.sanitize()?),
            Self::Http(config) => Self::Http(config.sanitize()?),
        })
    }
}

/// Transport discriminator, as shown to API clients and written to runtime
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpTransportKind {
    /// Local process stdio.
    Stdio,
    /// Server-sent events.
    Sse,
    /// Streamable HTTP.
    Http,
}

impl McpTransportKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Sse => "sse",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for McpTransportKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

fn sanitize_env(
    values: impl IntoIterator<Item = (String, String)>,
) -> Result<BTreeMap<String, String>, ToolRegistryDomainError> {
    values
        .into_iter()
        .map(|(name, value)| {
            let stored = sanitize_env_var(&name, &value)?;
            Ok((name, stored))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialized_transports_are_revalidated() {
        let transport: McpTransport = serde_json::from_value(json!({
            "kind": "stdio",
            "config": {"command": "bash", "args": ["-c", "echo"]}
        }))
        .expect("payload should deserialize");

        assert!(matches!(
            transport.sanitize(),
            Err(ToolRegistryDomainError::CommandNotAllowed(_))
        ));
    }

    #[test]
    fn remote_transport_defaults_to_verified_tls() {
        let transport: McpTransport = serde_json::from_value(json!({
            "kind": "sse",
            "config": {"url": "https://mcp.example.com/sse"}
        }))
        .expect("payload should deserialize");

        let McpTransport::Sse(config) = transport.sanitize().expect("transport is valid") else {
            panic!("expected an sse transport");
        };
        assert!(config.ssl_verify());
        assert!(config.headers().is_empty());
    }

    #[test]
    fn stdio_env_is_sanitised() {
        let result = StdioTransportConfig::new("npx")
            .expect("npx is allowed")
            .with_env([("LD_PRELOAD".to_owned(), "/tmp/x.so".to_owned())]);

        assert!(matches!(
            result,
            Err(ToolRegistryDomainError::BlockedEnvVar(_))
        ));
    }
}
