//! Admission rules for MCP server commands, environments and remote URLs.
//!
//! Stdio servers run as child processes of the flow runtime and remote
//! servers are contacted from inside the deployment, so both are checked
//! before anything is persisted.

use super::ToolRegistryDomainError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;
use url::{Host, Url};

/// Executables an MCP stdio server may be launched with.
pub const ALLOWED_COMMANDS: &[&str] = &[
    "node",
    "npx",
    "npm",
    "python",
    "python3",
    "uvx",
    "uv",
    "pipx",
    "mcp-server-sqlite",
    "mcp-server-filesystem",
    "mcp-server-github",
    "mcp-server-slack",
    "mcp-server-postgres",
    "mcp-server-puppeteer",
    "mcp-server-brave-search",
    "mcp-server-google-maps",
    "mcp-server-fetch",
    "mcp-server-memory",
    "mcp-server-time",
    "mcp-server-everything",
    "mcp-server-sequential-thinking",
];

/// Environment variables server configuration may never set.
pub const BLOCKED_ENV_VARS: &[&str] = &[
    "PATH",
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "PYTHONPATH",
    "NODE_PATH",
    "HOME",
    "USER",
    "SHELL",
    "PWD",
    "OLDPWD",
    "IFS",
    "CDPATH",
    "GLOBIGNORE",
    "BASH_ENV",
    "ENV",
];

/// Longest environment value kept; longer values are truncated.
pub const MAX_ENV_VALUE_LENGTH: usize = 4096;

const BLOCKED_HOST_FRAGMENTS: &[&str] = &["internal", "intranet", "private", "local"];

/// Returns the executable name of `command` (its final path component).
#[must_use]
pub fn executable_name(command: &str) -> &str {
    Path::new(command)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(command)
}

/// Validates a stdio command against the name pattern and the allowlist.
///
/// # Errors
///
/// Returns [`ToolRegistryDomainError`] when the command is empty, malformed
/// or not allowlisted.
pub fn validate_command(command: &str) -> Result<(), ToolRegistryDomainError> {
    if command.is_empty() {
        return Err(ToolRegistryDomainError::EmptyStdioCommand);
    }

    let name = executable_name(command);
    let mut characters = name.chars();
    let starts_well = characters
        .next()
        .is_some_and(|first| first.is_ascii_alphanumeric());
    let rest_ok = characters
        .all(|character| character.is_ascii_alphanumeric() || matches!(character, '.' | '_' | '-'));
    if !starts_well || !rest_ok {
        return Err(ToolRegistryDomainError::InvalidStdioCommand(
            command.to_owned(),
        ));
    }

    if !ALLOWED_COMMANDS.contains(&name) {
        return Err(ToolRegistryDomainError::CommandNotAllowed(name.to_owned()));
    }
    Ok(())
}

/// Validates an environment variable and returns its stored value.
///
/// # Errors
///
/// Returns [`ToolRegistryDomainError`] when the name is malformed or blocked.
pub fn sanitize_env_var(name: &str, value: &str) -> Result<String, ToolRegistryDomainError> {
    let mut characters = name.chars();
    let starts_well = characters
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_');
    let rest_ok = characters.all(|character| character.is_ascii_alphanumeric() || character == '_');
    if !starts_well || !rest_ok {
        return Err(ToolRegistryDomainError::InvalidEnvVarName(name.to_owned()));
    }

    if BLOCKED_ENV_VARS.contains(&name.to_ascii_uppercase().as_str()) {
        return Err(ToolRegistryDomainError::BlockedEnvVar(name.to_owned()));
    }

    Ok(value.chars().take(MAX_ENV_VALUE_LENGTH).collect())
}

/// Parses and validates the URL of a remote MCP server.
///
/// Only `http` and `https` are accepted. Hostnames containing a blocked
/// fragment such as `local` or `internal` are rejected, as are IP
/// literals in loopback, private, link-local or unique-local space. No DNS
/// lookup takes place.
///
/// # Errors
///
/// Returns [`ToolRegistryDomainError`] when the URL is rejected.
pub fn validate_remote_url(raw: &str) -> Result<Url, ToolRegistryDomainError> {
    if raw.is_empty() {
        return Err(ToolRegistryDomainError::EmptyRemoteUrl);
    }

    let invalid = |reason: &str| ToolRegistryDomainError::InvalidRemoteUrl {
        url: raw.to_owned(),
        reason: reason.to_owned(),
    };

    let parsed = Url::parse(raw).map_err(|err| invalid(&err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("only http and https are supported"));
    }

    match parsed.host() {
        None => return Err(invalid("missing host")),
        Some(Host::Domain(domain)) => {
            let lowered = domain.to_ascii_lowercase();
            if BLOCKED_HOST_FRAGMENTS
                .iter()
                .any(|fragment| lowered.contains(fragment))
            {
                return Err(ToolRegistryDomainError::BlockedRemoteHost(lowered));
            }
        }
        Some(Host::Ipv4(address)) => {
            if is_blocked_ip(IpAddr::V4(address)) {
                return Err(ToolRegistryDomainError::BlockedRemoteHost(
                    address.to_string(),
                ));
            }
        }
        Some(Host::Ipv6(address)) => {
            if is_blocked_ip(IpAddr::V6(address)) {
                return Err(ToolRegistryDomainError::BlockedRemoteHost(
                    address.to_string(),
                ));
            }
        }
    }

    Ok(parsed)
}

fn is_blocked_ip(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => is_blocked_ipv4(v4),
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map_or_else(|| is_blocked_ipv6(v6), is_blocked_ipv4),
    }
}

const fn is_blocked_ipv4(address: Ipv4Addr) -> bool {
    address.is_private()
        || address.is_loopback()
        || address.is_link_local()
        || address.is_unspecified()
}

fn is_blocked_ipv6(address: Ipv6Addr) -> bool {
    let [first_segment, ..] = address.segments();
    let unique_local = first_segment & 0xfe00 == 0xfc00;
    let link_local = first_segment & 0xffc0 == 0xfe80;
    address.is_loopback() || address.is_unspecified() || unique_local || link_local
}
