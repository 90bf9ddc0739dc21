//! Command-line and environment configuration for the server binary.

use clap::{Parser, ValueEnum};
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Base64 key material for credential encryption. Redacted in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialsKey(String);

impl CredentialsKey {
    /// Returns the encoded key.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl FromStr for CredentialsKey {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self(value.to_owned()))
    }
}

impl fmt::Debug for CredentialsKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("CredentialsKey(..)")
    }
}

/// Configuration for the switchboard server.
#[derive(Debug, Clone, Parser)]
#[command(name = "switchboard", version, about = "Agent publication and MCP bridge server")]
pub struct Config {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "SWITCHBOARD_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 7860, env = "SWITCHBOARD_PORT")]
    pub port: u16,

    /// `PostgreSQL` connection URL. In-memory storage is used when unset.
    #[arg(long, env = "SWITCHBOARD_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Base64-encoded 32-byte key sealing stored MCP server credentials.
    /// Credentials are written in plaintext when unset.
    #[arg(long, env = "SWITCHBOARD_CREDENTIALS_KEY", hide_env_values = true)]
    pub credentials_key: Option<CredentialsKey>,

    /// Maximum pooled database connections.
    #[arg(long, default_value_t = 10, env = "SWITCHBOARD_DATABASE_POOL_SIZE")]
    pub database_pool_size: u32,

    /// JSON file of identity tokens and the profiles they resolve to.
    #[arg(long, env = "SWITCHBOARD_IDENTITIES_FILE")]
    pub identities_file: Option<PathBuf>,

    /// Directory holding the per-tenant MCP runtime configuration files.
    #[arg(long, default_value = "mcp-config", env = "SWITCHBOARD_MCP_CONFIG_DIR")]
    pub mcp_config_dir: PathBuf,

    /// Flow runtime endpoint for bridge tool calls. Calls are echoed when
    /// unset.
    #[arg(long, env = "SWITCHBOARD_FLOW_RUNTIME_URL")]
    pub flow_runtime_url: Option<Url>,

    /// Health sweep interval in milliseconds.
    #[arg(long, default_value_t = 60_000, env = "SWITCHBOARD_HEALTH_INTERVAL_MS")]
    pub health_interval_ms: u64,

    /// Timeout for HTTP health probes in milliseconds.
    #[arg(long, default_value_t = 10_000, env = "SWITCHBOARD_PROBE_HTTP_TIMEOUT_MS")]
    pub probe_http_timeout_ms: u64,

    /// Timeout for stdio health probes in milliseconds.
    #[arg(long, default_value_t = 5_000, env = "SWITCHBOARD_PROBE_PROCESS_TIMEOUT_MS")]
    pub probe_process_timeout_ms: u64,

    /// Upper bound for applying one pending change, in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "SWITCHBOARD_SYNC_APPLY_TIMEOUT_MS")]
    pub sync_apply_timeout_ms: u64,

    /// Upper bound for one bridge tool call, in milliseconds.
    #[arg(long, default_value_t = 120_000, env = "SWITCHBOARD_TOOL_CALL_TIMEOUT_MS")]
    pub tool_call_timeout_ms: u64,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "SWITCHBOARD_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Config {
    /// Returns the socket address string to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Interval between health sweeps.
    #[must_use]
    pub const fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    /// Timeout for HTTP health probes.
    #[must_use]
    pub const fn probe_http_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_http_timeout_ms)
    }

    /// Timeout for stdio health probes.
    #[must_use]
    pub const fn probe_process_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_process_timeout_ms)
    }

    /// Upper bound for applying one pending change.
    #[must_use]
    pub const fn sync_apply_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_apply_timeout_ms)
    }

    /// Upper bound for one bridge tool call.
    #[must_use]
    pub const fn tool_call_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_call_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_service_timeouts() {
        let config = Config::parse_from(["switchboard"]);

        assert_eq!(config.tool_call_timeout(), Duration::from_secs(120));
        assert_eq!(config.sync_apply_timeout(), Duration::from_secs(30));
        assert_eq!(config.bind_address(), "127.0.0.1:7860");
        assert!(config.database_url.is_none());
    }

    #[rstest]
    #[case("text", LogFormat::Text)]
    #[case("json", LogFormat::Json)]
    fn log_format_is_parsed(#[case] raw: &str, #[case] expected: LogFormat) {
        let config = Config::parse_from(["switchboard", "--log-format", raw]);

        assert_eq!(config.log_format, expected);
    }

    #[test]
    fn credentials_key_is_redacted_in_debug_output() {
        let config = Config::parse_from(["switchboard", "--credentials-key", "c2VjcmV0LWtleQ=="]);

        let key = config.credentials_key.as_ref().expect("key parsed");
        assert_eq!(key.expose(), "c2VjcmV0LWtleQ==");
        assert!(!format!("{config:?}").contains("c2VjcmV0LWtleQ=="));
    }
}
