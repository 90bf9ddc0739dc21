//! Remote side of the bridge: an HTTP client used by desktop connectors.
//!
//! The client holds only the bridge token. It never caches the tool list;
//! [`ToolWatcher`] polls and publishes changes instead.

mod watcher;

pub use watcher::ToolWatcher;

use crate::bridge::domain::{BridgeTool, ToolCallResult};
use crate::skill::domain::WorkflowId;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const TOOLS_PATH: &str = "api/v1/mcp/bridge/tools";
const CALL_PATH: &str = "api/v1/mcp/bridge/tools/call";

/// Errors returned by [`BridgeClient`].
#[derive(Debug, Clone, Error)]
pub enum BridgeClientError {
    /// The server rejected the bridge token.
    #[error("bridge token rejected: {0}")]
    Unauthorized(String),
    /// The requested tool is not live.
    #[error("tool not found: {0}")]
    NotFound(String),
    /// The server answered with another non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the error envelope.
        message: String,
    },
    /// The server could not be reached after every retry.
    #[error("bridge server unreachable: {0}")]
    Transport(Arc<reqwest::Error>),
    /// The base URL cannot address the bridge routes.
    #[error("invalid bridge URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type for bridge client calls.
pub type BridgeClientResult<T> = Result<T, BridgeClientError>;

/// Reconnect policy for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between retries.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolList {
    tools: Vec<BridgeTool>,
}

#[derive(Debug, Serialize)]
struct CallBody<'a> {
    name: &'a str,
    arguments: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_id: Option<WorkflowId>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for the token-authenticated bridge routes.
///
/// Connection failures, timeouts and `5xx` answers are retried with
/// exponential backoff; any other answer is returned immediately.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    retry: RetryPolicy,
}

impl BridgeClient {
    /// Creates a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeClientError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn new(
        mut base_url: Url,
        token: impl Into<String>,
        request_timeout: Duration,
    ) -> BridgeClientResult<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| BridgeClientError::Transport(Arc::new(err)))?;
        Ok(Self {
            http,
            base_url,
            token: token.into(),
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches the tools that are live right now.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeClientError`] when the server rejects the request or
    /// stays unreachable.
    pub async fn list_tools(&self) -> BridgeClientResult<Vec<BridgeTool>> {
        let list: ToolList = self.send(Method::GET, TOOLS_PATH, None::<&()>).await?;
        Ok(list.tools)
    }

    /// Calls a tool by name, optionally pinning the workflow.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeClientError::NotFound`] when the tool is not live.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &Value,
        workflow_id: Option<WorkflowId>,
    ) -> BridgeClientResult<ToolCallResult> {
        let body = CallBody {
            name,
            arguments,
            workflow_id,
        };
        self.send(Method::POST, CALL_PATH, Some(&body)).await
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> BridgeClientResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1;

        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(&self.token);
            if let Some(payload) = body {
                request = request.json(payload);
            }

            let retryable = match request.send().await {
                Ok(response) if response.status().is_server_error() => {
                    let error = status_error(response).await;
                    tracing::debug!(%url, attempt, err = %error, "bridge server error");
                    error
                }
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<T>()
                        .await
                        .map_err(|err| BridgeClientError::Transport(Arc::new(err)));
                }
                Ok(response) => return Err(status_error(response).await),
                Err(err) if err.is_connect() || err.is_timeout() => {
                    tracing::debug!(%url, attempt, err = %err, "bridge server unreachable");
                    BridgeClientError::Transport(Arc::new(err))
                }
                Err(err) => return Err(BridgeClientError::Transport(Arc::new(err))),
            };

            if attempt >= self.retry.max_attempts {
                return Err(retryable);
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(self.retry.max_backoff);
            attempt += 1;
        }
    }
}

async fn status_error(response: reqwest::Response) -> BridgeClientError {
    let status = response.status();
    let raw = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&raw)
        .map_or(raw, |envelope| envelope.error.message);
    match status {
        StatusCode::UNAUTHORIZED => BridgeClientError::Unauthorized(message),
        StatusCode::NOT_FOUND => BridgeClientError::NotFound(message),
        other => BridgeClientError::Status {
            status: other.as_u16(),
            message,
        },
    }
}
