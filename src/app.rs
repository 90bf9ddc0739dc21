//! Server assembly: adapter selection, background tasks and the HTTP listener.

use crate::bridge::{
    adapters::{
        HttpFlowExecutor,
        memory::{InMemoryBridgeTokenRepository, InMemoryFlowExecutor},
        postgres::PostgresBridgeTokenRepository,
    },
    ports::FlowExecutor,
};
use crate::config::Config;
use crate::http::{self, Adapters, AppState, ServiceTimeouts};
use crate::publication::adapters::{
    memory::InMemoryAgentComponentRepository, postgres::PostgresAgentComponentRepository,
};
use crate::skill::adapters::{
    memory::InMemoryWorkflowRepository, postgres::PostgresWorkflowRepository,
};
use crate::tenant::{adapters::InMemoryIdentityResolver, ports::IdentityResolver};
use crate::tool_registry::adapters::{
    ConfigFileMcpRuntime, CredentialCipher, NetworkHealthProbe, memory::InMemoryMcpServerRegistry,
    postgres::PostgresMcpServerRegistry,
};
use anyhow::Context;
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builds the adapter set described by `config`.
///
/// # Errors
///
/// Returns an error when the identities file, the database pool or an HTTP
/// client cannot be set up.
pub async fn build_adapters(config: &Config) -> anyhow::Result<Adapters> {
    let identities: Arc<dyn IdentityResolver> = match &config.identities_file {
        Some(path) => Arc::new(
            InMemoryIdentityResolver::from_file(path)
                .with_context(|| format!("loading identities from {}", path.display()))?,
        ),
        None => {
            tracing::warn!("no identities file configured; every management call will be rejected");
            Arc::new(InMemoryIdentityResolver::new())
        }
    };

    let executor: Arc<dyn FlowExecutor> = match &config.flow_runtime_url {
        Some(url) => Arc::new(
            HttpFlowExecutor::new(url.clone(), config.tool_call_timeout())
                .context("building flow runtime client")?,
        ),
        None => {
            tracing::warn!("no flow runtime configured; bridge tool calls will be echoed");
            Arc::new(InMemoryFlowExecutor::new())
        }
    };

    let probe = NetworkHealthProbe::new(
        Arc::new(DefaultClock),
        config.probe_http_timeout(),
        config.probe_process_timeout(),
    )
    .context("building health probe")?;
    let runtime = ConfigFileMcpRuntime::new(&config.mcp_config_dir);

    let adapters = if let Some(database_url) = &config.database_url {
        let url = database_url.clone();
        let max_size = config.database_pool_size;
        let pool = tokio::task::spawn_blocking(move || {
            Pool::builder()
                .max_size(max_size)
                .build(ConnectionManager::<PgConnection>::new(url))
        })
        .await
        .context("database pool task failed")?
        .context("connecting to PostgreSQL")?;
        tracing::info!(pool_size = max_size, "using PostgreSQL storage");

        let mut mcp_servers = PostgresMcpServerRegistry::new(pool.clone());
        if let Some(key) = &config.credentials_key {
            let cipher = CredentialCipher::from_base64_key(key.expose())
                .context("reading the credentials key")?;
            mcp_servers = mcp_servers.with_cipher(cipher);
        } else {
            tracing::warn!("no credentials key configured; MCP credentials are stored in plaintext");
        }

        Adapters {
            identities,
            agents: Arc::new(PostgresAgentComponentRepository::new(pool.clone())),
            workflows: Arc::new(PostgresWorkflowRepository::new(pool.clone())),
            mcp_servers: Arc::new(mcp_servers),
            runtime: Arc::new(runtime),
            probe: Arc::new(probe),
            tokens: Arc::new(PostgresBridgeTokenRepository::new(pool)),
            executor,
        }
    } else {
        tracing::warn!("no database configured; using in-memory storage");
        Adapters {
            identities,
            agents: Arc::new(InMemoryAgentComponentRepository::new()),
            workflows: Arc::new(InMemoryWorkflowRepository::new()),
            mcp_servers: Arc::new(InMemoryMcpServerRegistry::new()),
            runtime: Arc::new(runtime),
            probe: Arc::new(probe),
            tokens: Arc::new(InMemoryBridgeTokenRepository::new()),
            executor,
        }
    };
    Ok(adapters)
}

/// Runs the server until interrupted.
///
/// # Errors
///
/// Returns an error when adapters cannot be built or the listener fails.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let adapters = build_adapters(&config).await?;
    let timeouts = ServiceTimeouts {
        sync_apply: config.sync_apply_timeout(),
        tool_call: config.tool_call_timeout(),
    };
    let state = Arc::new(AppState::new(adapters, timeouts));

    let monitor = Arc::clone(&state.health).spawn(config.health_interval(), shutdown.clone());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("switchboard listening on {addr}");

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutting down");
                signal_shutdown.cancel();
            }
            Err(err) => tracing::error!(err = %err, "failed to listen for shutdown signal"),
        }
    });

    let router = http::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await
        .context("HTTP server failed")?;

    shutdown.cancel();
    if let Err(err) = monitor.await {
        tracing::warn!(err = %err, "health monitor task failed");
    }
    Ok(())
}
