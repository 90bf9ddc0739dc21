//! Reachability probe over HTTP and child processes.

use crate::tool_registry::{
    domain::{
        McpServer, McpServerHealthSnapshot, McpTransport, RemoteTransportConfig,
        StdioTransportConfig, validation,
    },
    ports::HealthProbe,
};
use async_trait::async_trait;
use mockable::Clock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Probe that contacts remote servers and launches stdio commands.
///
/// Remote servers get a `HEAD` request, falling back to `GET` when the
/// request fails outright; any status below 400 is healthy. Redirects are
/// never followed, since their targets bypass URL validation. Stdio servers are
/// resolved on `PATH` and started with `--help` under a minimal environment;
/// a process still running at the deadline counts as started.
#[derive(Debug, Clone)]
pub struct NetworkHealthProbe<C> {
    verifying_client: reqwest::Client,
    lenient_client: reqwest::Client,
    process_timeout: Duration,
    clock: Arc<C>,
}

impl<C> NetworkHealthProbe<C>
where
    C: Clock + Send + Sync,
{
    /// Builds the probe's HTTP clients.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] when the TLS backend cannot be initialised.
    pub fn new(
        clock: Arc<C>,
        http_timeout: Duration,
        process_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            verifying_client: http_client(http_timeout, false)?,
            lenient_client: http_client(http_timeout, true)?,
            process_timeout,
            clock,
        })
    }

    async fn probe_remote(&self, config: &RemoteTransportConfig) -> McpServerHealthSnapshot {
        let checked_at = self.clock.utc();
        if let Err(err) = validation::validate_remote_url(config.url()) {
            tracing::warn!(url = %config.url(), err = %err, "refusing to probe blocked URL");
            return McpServerHealthSnapshot::unhealthy(checked_at, err.to_string());
        }

        let client = if config.ssl_verify() {
            &self.verifying_client
        } else {
            &self.lenient_client
        };
        let headers = build_headers(config);
        let started = Instant::now();

        let head = client.head(config.url()).headers(headers.clone()).send().await;
        let response = match head {
            Ok(response) => Ok(response),
            Err(_) => client.get(config.url()).headers(headers).send().await,
        };
        let latency_ms = started.elapsed().as_millis();

        match response {
            Ok(response) if response.status().as_u16() < 400 => McpServerHealthSnapshot::healthy(
                checked_at,
                format!(
                    "server responded with status {} ({latency_ms}ms)",
                    response.status().as_u16()
                ),
            ),
            Ok(response) => McpServerHealthSnapshot::unhealthy(
                checked_at,
                format!("server returned error status {}", response.status().as_u16()),
            ),
            Err(err) if err.is_timeout() => {
                McpServerHealthSnapshot::unhealthy(checked_at, "connection timed out")
            }
            Err(err) if err.is_connect() => McpServerHealthSnapshot::unhealthy(
                checked_at,
                format!("could not connect to {}", config.url()),
            ),
            Err(err) => McpServerHealthSnapshot::unhealthy(
                checked_at,
                format!("HTTP request failed: {err}"),
            ),
        }
    }

    async fn probe_stdio(
        &self,
        config: &StdioTransportConfig,
        server: &McpServer,
    ) -> McpServerHealthSnapshot {
        let checked_at = self.clock.utc();
        let command = config.command();
        if let Err(err) = validation::validate_command(command) {
            return McpServerHealthSnapshot::unhealthy(checked_at, err.to_string());
        }
        let Some(executable) = resolve_on_path(command) else {
            return McpServerHealthSnapshot::unhealthy(
                checked_at,
                format!("command '{command}' not found in PATH"),
            );
        };

        let spawned = Command::new(&executable)
            .arg("--help")
            .env_clear()
            .envs(minimal_env())
            .envs(config.env())
            .envs(server.credentials().iter())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                return McpServerHealthSnapshot::unhealthy(
                    checked_at,
                    format!("failed to spawn '{command}': {err}"),
                );
            }
        };

        match tokio::time::timeout(self.process_timeout, child.wait()).await {
            Ok(Ok(_)) => McpServerHealthSnapshot::healthy(
                checked_at,
                format!("command '{command}' is available and executable"),
            ),
            Ok(Err(err)) => McpServerHealthSnapshot::unhealthy(
                checked_at,
                format!("command '{command}' failed: {err}"),
            ),
            Err(_) => {
                if let Err(err) = child.kill().await {
                    tracing::warn!(command, err = %err, "failed to stop probe process");
                }
                McpServerHealthSnapshot::healthy(
                    checked_at,
                    format!("command '{command}' started (timed out on --help)"),
                )
            }
        }
    }
}

#[async_trait]
impl<C> HealthProbe for NetworkHealthProbe<C>
where
    C: Clock + Send + Sync,
{
    async fn probe(&self, server: &McpServer) -> McpServerHealthSnapshot {
        match server.transport() {
            McpTransport::Stdio(config) => self.probe_stdio(config, server).await,
            McpTransport::Sse(config) | McpTransport::Http(config) => {
                self.probe_remote(config).await
            }
        }
    }
}

fn http_client(timeout: Duration, accept_invalid_certs: bool) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
}

fn build_headers(config: &RemoteTransportConfig) -> HeaderMap {
    config
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let header_name = HeaderName::from_bytes(name.as_bytes()).ok()?;
            let header_value = HeaderValue::from_str(value).ok()?;
            Some((header_name, header_value))
        })
        .collect()
}

fn minimal_env() -> Vec<(&'static str, String)> {
    vec![
        (
            "PATH",
            std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_owned()),
        ),
        (
            "HOME",
            std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_owned()),
        ),
        (
            "LANG",
            std::env::var("LANG").unwrap_or_else(|_| "en_US.UTF-8".to_owned()),
        ),
    ]
}

fn resolve_on_path(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path)
        .map(|directory| directory.join(command))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::TenantId;
    use crate::tool_registry::domain::{McpServerHealthStatus, McpServerName};
    use axum::Router;
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use mockable::DefaultClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve router");
        });
        format!("http://{addr}")
    }

    fn probe() -> NetworkHealthProbe<DefaultClock> {
        NetworkHealthProbe::new(
            Arc::new(DefaultClock),
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
        .expect("probe builds")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_executables_are_unhealthy() {
        let name = McpServerName::new("ghost").expect("valid server name");
        let transport =
            McpTransport::stdio("mcp-server-sequential-thinking").expect("valid transport");
        let server = McpServer::new(TenantId::new(), name, transport, &DefaultClock);

        let snapshot = probe().probe(&server).await;

        assert_eq!(snapshot.status(), McpServerHealthStatus::Unhealthy);
        assert!(snapshot.message().is_some_and(|text| text.contains("not found")));
    }

    #[test]
    fn invalid_headers_are_skipped() {
        let config = RemoteTransportConfig::new("https://mcp.example.com")
            .expect("valid URL")
            .with_headers([
                ("Authorization".to_owned(), "Bearer abc".to_owned()),
                ("bad header".to_owned(), "x".to_owned()),
            ]);

        let headers = build_headers(&config);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key("authorization"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn redirects_are_reported_without_being_followed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let target = serve(Router::new().route(
            "/",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { "metadata" }
            }),
        ))
        .await;
        let location = format!("{target}/");
        let redirecting = serve(Router::new().route(
            "/",
            get(move || {
                let destination = location.clone();
                async move { (StatusCode::FOUND, [(header::LOCATION, destination)]).into_response() }
            }),
        ))
        .await;

        for accept_invalid_certs in [false, true] {
            let client =
                http_client(Duration::from_secs(2), accept_invalid_certs).expect("client builds");
            let response = client
                .get(format!("{redirecting}/"))
                .send()
                .await
                .expect("redirect response");
            assert_eq!(response.status().as_u16(), 302);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
