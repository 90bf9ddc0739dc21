//! HTTP API tests against the router over in-memory adapters.

mod test_helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use switchboard::http::{ErrorCode, ErrorResponse, build_router};
use switchboard::http::handlers::{
    bridge::ToolListView,
    desktop::BootstrapView,
    mcp_servers::{ConnectionTestView, McpServerView},
};
use switchboard::publication::domain::AgentComponentId;
use switchboard::tool_registry::domain::McpServerHealthStatus;

use test_helpers::{IDENTITY, OTHER_IDENTITY, Stack};

struct Api {
    stack: Stack,
    server: TestServer,
}

#[fixture]
fn api() -> Api {
    let stack = Stack::new();
    let server =
        TestServer::new(build_router(Arc::new(stack.state.clone()))).expect("test server");
    Api { stack, server }
}

fn stdio_server(name: &str) -> Value {
    json!({
        "name": name,
        "transport": {
            "kind": "stdio",
            "config": { "command": "npx", "args": ["-y", "@modelcontextprotocol/server-memory"] }
        },
        "credentials": { "API_KEY": "secret-value" }
    })
}

#[rstest]
#[case("/health")]
#[case("/api/v1/health")]
#[tokio::test(flavor = "multi_thread")]
async fn health_is_served_without_authentication(api: Api, #[case] path: &str) {
    let response = api.server.get(path).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));
}

#[rstest]
#[case("/api/v1/agent-components")]
#[case("/api/v1/workflows")]
#[case("/api/v1/mcp-servers")]
#[case("/api/v1/restart-status")]
#[case("/api/v1/desktop/bootstrap")]
#[case("/api/v1/mcp/bridge/tools")]
#[tokio::test(flavor = "multi_thread")]
async fn missing_token_is_rejected_with_error_envelope(api: Api, #[case] path: &str) {
    let response = api.server.get(path).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body = response.json::<ErrorResponse>();
    assert_eq!(body.error.code, ErrorCode::Unauthorized);
    assert!(!body.error.message.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_identity_is_rejected(api: Api) {
    let response = api
        .server
        .get("/api/v1/agent-components")
        .authorization_bearer("identity-nobody")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publishing_reports_the_demoted_agent(api: Api) {
    let mut ids = Vec::new();
    for name in ["First", "Second"] {
        let response = api
            .server
            .post("/api/v1/agent-components")
            .authorization_bearer(IDENTITY)
            .json(&json!({ "name": name, "qa_who": "A helpful assistant" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created = response.json::<Value>();
        assert_eq!(created["is_published"], json!(false));
        ids.push(created["id"].as_str().expect("id").to_owned());
    }
    let [first, second] = ids.as_slice() else {
        panic!("two agents created");
    };

    api.server
        .post(&format!("/api/v1/agent-components/{first}/publish"))
        .authorization_bearer(IDENTITY)
        .await
        .assert_status_ok();
    let response = api
        .server
        .post(&format!("/api/v1/agent-components/{second}/publish"))
        .authorization_bearer(IDENTITY)
        .await;

    response.assert_status_ok();
    let published = response.json::<Value>();
    assert_eq!(published["id"], json!(second));
    assert_eq!(published["is_published"], json!(true));
    assert_eq!(published["demoted"], json!([first]));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn another_tenants_agent_is_not_found(api: Api) {
    let agent = api.stack.agent("Private").await;

    let response = api
        .server
        .post(&format!("/api/v1/agent-components/{}/publish", agent.id()))
        .authorization_bearer(OTHER_IDENTITY)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<ErrorResponse>().error.code, ErrorCode::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publishing_an_unknown_agent_is_not_found(api: Api) {
    let response = api
        .server
        .post(&format!(
            "/api/v1/agent-components/{}/publish",
            AgentComponentId::new()
        ))
        .authorization_bearer(IDENTITY)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<ErrorResponse>().error.code, ErrorCode::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unpublishing_twice_succeeds_both_times(api: Api) {
    let agent = api.stack.agent("Helper").await;
    api.server
        .post(&format!("/api/v1/agent-components/{}/publish", agent.id()))
        .authorization_bearer(IDENTITY)
        .await
        .assert_status_ok();

    for _ in 0..2 {
        let response = api
            .server
            .post(&format!("/api/v1/agent-components/{}/unpublish", agent.id()))
            .authorization_bearer(IDENTITY)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["is_published"], json!(false));
    }
}

#[rstest]
#[case(json!({}))]
#[case(json!({ "is_agent_skill": "yes" }))]
#[tokio::test(flavor = "multi_thread")]
async fn agent_skill_toggle_requires_a_boolean(api: Api, #[case] body: Value) {
    let workflow = api.stack.skill("Summarise").await;

    let response = api
        .server
        .patch(&format!("/api/v1/workflows/{}/agent-skill", workflow.id()))
        .authorization_bearer(IDENTITY)
        .json(&body)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ErrorResponse>().error.code, ErrorCode::Validation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn agent_skill_toggle_updates_the_workflow(api: Api) {
    let workflow = api.stack.skill("Summarise").await;

    let response = api
        .server
        .patch(&format!("/api/v1/workflows/{}/agent-skill", workflow.id()))
        .authorization_bearer(IDENTITY)
        .json(&json!({ "is_agent_skill": false }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["is_agent_skill"], json!(false));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registered_server_never_echoes_credentials(api: Api) {
    let response = api
        .server
        .post("/api/v1/mcp-servers")
        .authorization_bearer(IDENTITY)
        .json(&stdio_server("memory"))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert!(!response.text().contains("secret-value"));
    let server = response.json::<McpServerView>();
    assert!(server.has_credentials);
    assert!(server.needs_sync);
    assert!(server.is_enabled);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_server_name_conflicts(api: Api) {
    api.server
        .post("/api/v1/mcp-servers")
        .authorization_bearer(IDENTITY)
        .json(&stdio_server("memory"))
        .await
        .assert_status(StatusCode::CREATED);

    let response = api
        .server
        .post("/api/v1/mcp-servers")
        .authorization_bearer(IDENTITY)
        .json(&stdio_server("memory"))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<ErrorResponse>().error.code, ErrorCode::Conflict);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sync_drains_the_restart_status(api: Api) {
    api.server
        .post("/api/v1/mcp-servers")
        .authorization_bearer(IDENTITY)
        .json(&stdio_server("memory"))
        .await
        .assert_status(StatusCode::CREATED);
    let before = api
        .server
        .get("/api/v1/restart-status")
        .authorization_bearer(IDENTITY)
        .await
        .json::<Value>();
    assert_eq!(before["pending_changes"].as_array().map(Vec::len), Some(1));
    assert_eq!(before["last_sync_at"], Value::Null);

    let report = api
        .server
        .post("/api/v1/mcp-servers/sync")
        .authorization_bearer(IDENTITY)
        .await;
    report.assert_status_ok();
    assert_eq!(report.json::<Value>()["applied"].as_array().map(Vec::len), Some(1));

    let after = api
        .server
        .get("/api/v1/restart-status")
        .authorization_bearer(IDENTITY)
        .await
        .json::<Value>();
    assert_eq!(after["pending_changes"], json!([]));
    assert!(after["last_sync_at"].is_string());
    let listed = api
        .server
        .get("/api/v1/mcp-servers")
        .authorization_bearer(IDENTITY)
        .await
        .json::<Vec<McpServerView>>();
    assert!(listed.iter().all(|server| !server.needs_sync));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_check_is_readable_with_get(api: Api) {
    let created = api
        .server
        .post("/api/v1/mcp-servers")
        .authorization_bearer(IDENTITY)
        .json(&stdio_server("memory"))
        .await
        .json::<McpServerView>();

    let response = api
        .server
        .get(&format!("/api/v1/mcp-servers/{}/health", created.id))
        .authorization_bearer(IDENTITY)
        .await;

    response.assert_status_ok();
    let checked = response.json::<McpServerView>();
    assert_eq!(checked.health_status, McpServerHealthStatus::Healthy);
    assert!(checked.last_health_check.is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connection_test_stores_nothing(api: Api) {
    let response = api
        .server
        .post("/api/v1/mcp-servers/test-connection")
        .authorization_bearer(IDENTITY)
        .json(&json!({
            "transport": {
                "kind": "stdio",
                "config": { "command": "npx", "args": ["-y", "@modelcontextprotocol/server-memory"] }
            },
            "credentials": { "API_KEY": "secret-value" }
        }))
        .await;

    response.assert_status_ok();
    assert!(!response.text().contains("secret-value"));
    let outcome = response.json::<ConnectionTestView>();
    assert!(outcome.success);
    assert_eq!(outcome.status, McpServerHealthStatus::Healthy);
    let listed = api
        .server
        .get("/api/v1/mcp-servers")
        .authorization_bearer(IDENTITY)
        .await
        .json::<Vec<McpServerView>>();
    assert!(listed.is_empty());
    let status = api
        .server
        .get("/api/v1/restart-status")
        .authorization_bearer(IDENTITY)
        .await
        .json::<Value>();
    assert_eq!(status["pending_changes"], json!([]));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connection_test_rejects_internal_urls(api: Api) {
    let response = api
        .server
        .post("/api/v1/mcp-servers/test-connection")
        .authorization_bearer(IDENTITY)
        .json(&json!({
            "transport": { "kind": "http", "config": { "url": "http://169.254.169.254/latest" } }
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ErrorResponse>().error.code, ErrorCode::Validation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_server_returns_no_content(api: Api) {
    let created = api
        .server
        .post("/api/v1/mcp-servers")
        .authorization_bearer(IDENTITY)
        .json(&stdio_server("memory"))
        .await
        .json::<McpServerView>();

    api.server
        .delete(&format!("/api/v1/mcp-servers/{}", created.id))
        .authorization_bearer(IDENTITY)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    api.server
        .get(&format!("/api/v1/mcp-servers/{}", created.id))
        .authorization_bearer(IDENTITY)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bootstrap_returns_live_agent_skills_and_token(api: Api) {
    let agent = api.stack.agent("Helper").await;
    api.stack.skill("Summarise").await;
    api.stack
        .state
        .publication
        .publish(api.stack.tenant, agent.id())
        .await
        .expect("publish");

    let response = api
        .server
        .get("/api/v1/desktop/bootstrap")
        .authorization_bearer(IDENTITY)
        .await;

    response.assert_status_ok();
    let bootstrap = response.json::<BootstrapView>();
    assert_eq!(bootstrap.user.email, "alice@example.com");
    assert_eq!(bootstrap.user.first_name.as_deref(), Some("Alice"));
    let live = bootstrap.published_agent.expect("live agent");
    assert_eq!(live.id, agent.id());
    assert!(live.is_published);
    assert_eq!(bootstrap.skills.len(), 1);
    assert!(bootstrap.mcp_token.starts_with("brg_"));

    let again = api
        .server
        .get("/api/v1/desktop/bootstrap")
        .authorization_bearer(IDENTITY)
        .await
        .json::<BootstrapView>();
    assert_eq!(again.mcp_token, bootstrap.mcp_token);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bridge_lists_tools_on_the_user_route(api: Api) {
    let agent = api.stack.agent("Helper").await;
    let skill = api.stack.skill("Summarise").await;
    api.stack
        .state
        .publication
        .publish(api.stack.tenant, agent.id())
        .await
        .expect("publish");
    let token = api.stack.bridge_token().await;

    let response = api
        .server
        .get(&format!("/api/v1/mcp/bridge/{}/tools", api.stack.tenant))
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let listed = response.json::<ToolListView>();
    let tool = listed.tools.first().expect("one tool");
    assert_eq!(tool.name, "summarise");
    assert_eq!(tool.workflow_id, skill.id());
    assert!(response.text().contains("inputSchema"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bridge_user_route_rejects_another_tenant(api: Api) {
    let token = api.stack.bridge_token().await;

    let response = api
        .server
        .get(&format!("/api/v1/mcp/bridge/{}/tools", api.stack.other_tenant))
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bridge_call_without_live_agent_is_not_found(api: Api) {
    api.stack.skill("Summarise").await;
    let token = api.stack.bridge_token().await;

    let response = api
        .server
        .post("/api/v1/mcp/bridge/tools/call")
        .authorization_bearer(&token)
        .json(&json!({ "name": "summarise", "arguments": { "message": "hi" } }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bridge_call_runs_against_the_live_agent(api: Api) {
    let agent = api.stack.agent("Helper").await;
    api.stack.skill("Summarise").await;
    api.stack
        .state
        .publication
        .publish(api.stack.tenant, agent.id())
        .await
        .expect("publish");
    let token = api.stack.bridge_token().await;

    let response = api
        .server
        .post("/api/v1/mcp/bridge/tools/call")
        .authorization_bearer(&token)
        .json(&json!({ "name": "summarise", "arguments": { "message": "hi" } }))
        .await;

    response.assert_status_ok();
    let result = response.json::<Value>();
    assert_eq!(result["isError"], json!(false));
    assert_eq!(result["content"][0]["text"], json!("Helper: hi"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revoked_bridge_token_stops_working(api: Api) {
    let token = api.stack.bridge_token().await;

    let revoked = api
        .server
        .post("/api/v1/desktop/bridge-token/revoke")
        .authorization_bearer(IDENTITY)
        .await;
    revoked.assert_status_ok();
    assert_eq!(revoked.json::<Value>()["revoked"], json!(true));

    api.server
        .get("/api/v1/mcp/bridge/tools")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
