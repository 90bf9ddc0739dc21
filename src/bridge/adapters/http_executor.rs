//! Flow executor that forwards tool calls to the flow runtime over HTTP.

use crate::bridge::ports::{FlowExecutor, FlowExecutorError, FlowExecutorResult};
use crate::publication::domain::{AgentComponent, AgentComponentId};
use crate::skill::domain::{Workflow, WorkflowId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    agent_id: AgentComponentId,
    workflow_id: WorkflowId,
    message: &'a str,
    arguments: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    response: String,
}

/// Posts `{agent_id, workflow_id, message, arguments}` to the runtime and
/// reads back `{response}`.
///
/// Every call starts a new conversation in the runtime.
#[derive(Debug, Clone)]
pub struct HttpFlowExecutor {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpFlowExecutor {
    /// Creates an executor for the runtime's execute endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] when the HTTP client cannot be built.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl FlowExecutor for HttpFlowExecutor {
    async fn execute(
        &self,
        agent: &AgentComponent,
        workflow: &Workflow,
        arguments: &Value,
    ) -> FlowExecutorResult<String> {
        let message = arguments
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let body = ExecuteRequest {
            agent_id: agent.id(),
            workflow_id: workflow.id(),
            message,
            arguments,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(FlowExecutorError::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FlowExecutorError::Failed(format!(
                "runtime returned {status}: {}",
                detail.trim()
            )));
        }

        let parsed: ExecuteResponse = response
            .json()
            .await
            .map_err(FlowExecutorError::unavailable)?;
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publication::domain::AgentPersona;
    use crate::skill::domain::WorkflowName;
    use crate::tenant::TenantId;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use mockable::DefaultClock;
    use serde_json::json;

    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("listener has an address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        Url::parse(&format!("http://{addr}/execute")).expect("valid url")
    }

    fn fixtures() -> (AgentComponent, Workflow) {
        let tenant_id = TenantId::new();
        let agent = AgentComponent::new(
            tenant_id,
            AgentPersona::new("Charlie").expect("valid persona"),
            &DefaultClock,
        );
        let workflow = Workflow::new(
            tenant_id,
            WorkflowName::new("Grade Essay").expect("valid name"),
            &DefaultClock,
        );
        (agent, workflow)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn posts_message_and_reads_response() {
        let endpoint = serve(Router::new().route(
            "/execute",
            post(|Json(body): Json<Value>| async move {
                let message = body["message"].as_str().unwrap_or_default().to_owned();
                Json(json!({"response": format!("echo {message}")}))
            }),
        ))
        .await;
        let executor =
            HttpFlowExecutor::new(endpoint, Duration::from_secs(5)).expect("client builds");
        let (agent, workflow) = fixtures();

        let text = executor
            .execute(&agent, &workflow, &json!({"message": "hello"}))
            .await
            .expect("call should succeed");

        assert_eq!(text, "echo hello");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn error_status_is_a_flow_failure() {
        let endpoint = serve(Router::new().route(
            "/execute",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "flow exploded") }),
        ))
        .await;
        let executor =
            HttpFlowExecutor::new(endpoint, Duration::from_secs(5)).expect("client builds");
        let (agent, workflow) = fixtures();

        let result = executor.execute(&agent, &workflow, &json!({})).await;

        assert!(matches!(
            result,
            Err(FlowExecutorError::Failed(reason)) if reason.contains("flow exploded")
        ));
    }
}
