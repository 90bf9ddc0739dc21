//! Health probing records status without touching configuration.

use rstest::rstest;
use switchboard::tool_registry::{
    domain::{McpServer, McpServerHealthStatus, McpTransport},
    services::{CreateMcpServerRequest, HealthMonitorError},
};

use crate::test_helpers::{Stack, stack};

async fn register(stack: &Stack, name: &str) -> McpServer {
    let transport = McpTransport::stdio("npx").expect("valid transport");
    stack
        .state
        .mcp_servers
        .create(stack.tenant, CreateMcpServerRequest::new(name, transport))
        .await
        .expect("register server")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_unhealthy_server_does_not_affect_others(stack: Stack) {
    let good = register(&stack, "good").await;
    let bad = register(&stack, "bad").await;
    stack
        .probe
        .script(bad.name(), McpServerHealthStatus::Unhealthy);

    let probed = stack.state.health.probe_all().await.expect("sweep");
    assert_eq!(probed, 2);

    let good_after = stack
        .state
        .mcp_servers
        .get(stack.tenant, good.id())
        .await
        .expect("reload good");
    let bad_after = stack
        .state
        .mcp_servers
        .get(stack.tenant, bad.id())
        .await
        .expect("reload bad");
    assert_eq!(good_after.health().status(), McpServerHealthStatus::Healthy);
    assert_eq!(bad_after.health().status(), McpServerHealthStatus::Unhealthy);
    assert_eq!(bad_after.health().message(), Some("scripted failure"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn probing_never_changes_configuration_or_queue(stack: Stack) {
    let server = register(&stack, "watched").await;
    stack
        .probe
        .script(server.name(), McpServerHealthStatus::Unhealthy);
    let before = stack
        .state
        .restart
        .restart_status(stack.tenant)
        .await
        .expect("status before");

    let checked = stack
        .state
        .health
        .check(stack.tenant, server.id())
        .await
        .expect("check");

    let after = stack
        .state
        .restart
        .restart_status(stack.tenant)
        .await
        .expect("status after");
    assert_eq!(before.pending_changes, after.pending_changes);
    assert_eq!(checked.is_enabled(), server.is_enabled());
    assert_eq!(checked.transport(), server.transport());
    assert_eq!(checked.updated_at(), server.updated_at());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disabled_servers_are_skipped_by_the_sweep(stack: Stack) {
    let server = register(&stack, "dormant").await;
    stack
        .state
        .mcp_servers
        .disable(stack.tenant, server.id())
        .await
        .expect("disable");

    let probed = stack.state.health.probe_all().await.expect("sweep");

    assert_eq!(probed, 0);
    let reloaded = stack
        .state
        .mcp_servers
        .get(stack.tenant, server.id())
        .await
        .expect("reload");
    assert_eq!(reloaded.health().status(), McpServerHealthStatus::Unknown);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn checking_a_foreign_server_is_not_found(stack: Stack) {
    let server = register(&stack, "private").await;

    let result = stack.state.health.check(stack.other_tenant, server.id()).await;

    assert!(matches!(result, Err(HealthMonitorError::NotFound(_))));
}
