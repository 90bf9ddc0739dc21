//! Flow runtime adapter that maintains per-tenant MCP configuration files.
//!
//! Each tenant gets `<directory>/<tenant_id>.mcp.json` holding a single
//! `mcpServers` object keyed by server name, the layout MCP clients read.
//! Files are replaced by writing a sibling temporary file and renaming it.

use crate::tenant::TenantId;
use crate::tool_registry::{
    domain::{ChangeKind, McpServer, McpTransport, PendingChange},
    ports::{McpRuntime, McpRuntimeError, McpRuntimeResult},
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const SERVERS_KEY: &str = "mcpServers";

/// Runtime that renders enabled and disabled servers into JSON files.
#[derive(Debug, Clone)]
pub struct ConfigFileMcpRuntime {
    directory: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl ConfigFileMcpRuntime {
    /// Creates a runtime writing into `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the configuration file path for a tenant.
    #[must_use]
    pub fn config_path(&self, tenant_id: TenantId) -> PathBuf {
        self.directory.join(format!("{tenant_id}.mcp.json"))
    }
}

#[async_trait]
impl McpRuntime for ConfigFileMcpRuntime {
    async fn apply(
        &self,
        change: &PendingChange,
        current: Option<&McpServer>,
    ) -> McpRuntimeResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.config_path(change.tenant_id());
        let mut servers = read_servers(&path).await?;

        if let Some(previous_name) = change.previous_name() {
            servers.remove(previous_name);
        }
        match (change.kind(), current) {
            (ChangeKind::Delete, _) | (_, None) => {
                servers.remove(change.entity_name());
            }
            (_, Some(server)) => {
                servers.insert(server.name().as_str().to_owned(), render_entry(server));
            }
        }

        write_atomically(&self.directory, &path, &json!({ SERVERS_KEY: servers })).await
    }
}

async fn read_servers(path: &Path) -> McpRuntimeResult<Map<String, Value>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(err) => return Err(McpRuntimeError::unavailable(err)),
    };
    let document: Value = serde_json::from_slice(&raw).map_err(McpRuntimeError::unavailable)?;
    match document.get(SERVERS_KEY) {
        Some(Value::Object(servers)) => Ok(servers.clone()),
        None => Ok(Map::new()),
        Some(_) => Err(McpRuntimeError::Rejected(format!(
            "{} has a malformed '{SERVERS_KEY}' entry",
            path.display()
        ))),
    }
}

async fn write_atomically(directory: &Path, path: &Path, document: &Value) -> McpRuntimeResult<()> {
    let rendered = serde_json::to_vec_pretty(document).map_err(McpRuntimeError::unavailable)?;
    let staging = path.with_extension("json.tmp");

    tokio::fs::create_dir_all(directory)
        .await
        .map_err(McpRuntimeError::unavailable)?;
    tokio::fs::write(&staging, rendered)
        .await
        .map_err(McpRuntimeError::unavailable)?;
    tokio::fs::rename(&staging, path)
        .await
        .map_err(McpRuntimeError::unavailable)
}

fn render_entry(server: &McpServer) -> Value {
    let disabled = !server.is_enabled();
    match server.transport() {
        McpTransport::Stdio(config) => {
            let mut env: Map<String, Value> = config
                .env()
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect();
            for (key, value) in server.credentials().iter() {
                env.insert(key.to_owned(), Value::String(value.to_owned()));
            }
            json!({
                "command": config.command(),
                "args": config.args(),
                "env": env,
                "disabled": disabled,
            })
        }
        McpTransport::Sse(config) | McpTransport::Http(config) => json!({
            "url": config.url(),
            "transport": server.transport().kind().as_str(),
            "headers": config.headers(),
            "ssl_verify": config.ssl_verify(),
            "disabled": disabled,
        }),
    }
}
