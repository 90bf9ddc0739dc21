//! Registry changes converge on the runtime through sync.

use std::collections::{BTreeMap, HashSet};

use rstest::rstest;
use switchboard::tool_registry::{
    domain::{ChangeKind, McpServer, McpTransport},
    services::{CreateMcpServerRequest, UpdateMcpServerRequest},
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
async fn sync_applies_queued_changes_in_order(stack: Stack) {
    let alpha = register(&stack, "alpha").await;
    register(&stack, "beta").await;
    stack
        .state
        .mcp_servers
        .disable(stack.tenant, alpha.id())
        .await
        .expect("disable alpha");

    let status = stack
        .state
        .restart
        .restart_status(stack.tenant)
        .await
        .expect("restart status");
    let kinds: Vec<_> = status.pending_changes.iter().map(|change| change.kind()).collect();
    assert_eq!(kinds, [ChangeKind::Create, ChangeKind::Create, ChangeKind::Disable]);
    assert!(status.last_sync_at.is_none());

    let report = stack.state.restart.sync(stack.tenant).await.expect("sync");

    assert!(report.is_complete());
    assert_eq!(report.applied.len(), 3);
    assert!(report.last_sync_at.is_some());
    let expected = BTreeMap::from([("alpha".to_owned(), false), ("beta".to_owned(), true)]);
    assert_eq!(stack.runtime.live_servers(stack.tenant), expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn partial_failure_keeps_failed_changes_queued(stack: Stack) {
    register(&stack, "stable").await;
    register(&stack, "flaky").await;
    stack.runtime.fail_for("flaky");

    let report = stack.state.restart.sync(stack.tenant).await.expect("sync");

    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed.first().expect("one failure").entity_name, "flaky");
    assert_eq!(report.pending_changes.len(), 1);
    assert!(report.last_sync_at.is_none());

    stack.runtime.recover("flaky");
    let retried = stack.state.restart.sync(stack.tenant).await.expect("retry sync");

    assert!(retried.is_complete());
    assert!(retried.last_sync_at.is_some());
    assert_eq!(stack.runtime.live_servers(stack.tenant).len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn renames_and_deletes_converge(stack: Stack) {
    let server = register(&stack, "old-name").await;
    let doomed = register(&stack, "doomed").await;
    stack.state.restart.sync(stack.tenant).await.expect("initial sync");

    let rename = UpdateMcpServerRequest {
        name: Some("new-name".to_owned()),
        ..UpdateMcpServerRequest::default()
    };
    stack
        .state
        .mcp_servers
        .update(stack.tenant, server.id(), rename)
        .await
        .expect("rename");
    stack
        .state
        .mcp_servers
        .delete(stack.tenant, doomed.id())
        .await
        .expect("delete");

    let report = stack.state.restart.sync(stack.tenant).await.expect("sync");

    assert!(report.is_complete());
    let live = stack.runtime.live_servers(stack.tenant);
    assert_eq!(live.keys().collect::<Vec<_>>(), ["new-name"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_syncs_apply_each_change_once(stack: Stack) {
    for index in 0..5 {
        register(&stack, &format!("server-{index}")).await;
    }

    let (first, second) = tokio::join!(
        stack.state.restart.sync(stack.tenant),
        stack.state.restart.sync(stack.tenant)
    );
    first.expect("first sync");
    second.expect("second sync");

    let applied = stack.runtime.applied();
    let unique: HashSet<_> = applied.iter().collect();
    assert_eq!(applied.len(), 5);
    assert_eq!(unique.len(), 5);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tenants_sync_independently(stack: Stack) {
    register(&stack, "mine").await;
    let theirs = McpTransport::stdio("npx").expect("valid transport");
    stack
        .state
        .mcp_servers
        .create(stack.other_tenant, CreateMcpServerRequest::new("theirs", theirs))
        .await
        .expect("register other tenant server");

    stack.state.restart.sync(stack.tenant).await.expect("sync");

    let theirs_status = stack
        .state
        .restart
        .restart_status(stack.other_tenant)
        .await
        .expect("other tenant status");
    assert_eq!(theirs_status.pending_changes.len(), 1);
    assert!(stack.runtime.live_servers(stack.other_tenant).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_rename_holds_back_a_new_server_reusing_the_old_name(stack: Stack) {
    let original = register(&stack, "a").await;
    stack.state.restart.sync(stack.tenant).await.expect("initial sync");
    let rename = UpdateMcpServerRequest {
        name: Some("b".to_owned()),
        ..UpdateMcpServerRequest::default()
    };
    stack
        .state
        .mcp_servers
        .update(stack.tenant, original.id(), rename)
        .await
        .expect("rename a to b");
    let replacement = register(&stack, "a").await;
    stack.runtime.fail_for("b");

    let blocked = stack.state.restart.sync(stack.tenant).await.expect("sync");

    assert!(blocked.applied.is_empty());
    assert_eq!(blocked.pending_changes.len(), 2);
    assert!(
        blocked
            .pending_changes
            .iter()
            .any(|change| change.server_id() == Some(replacement.id()))
    );

    stack.runtime.recover("b");
    let retried = stack.state.restart.sync(stack.tenant).await.expect("retry sync");

    assert!(retried.is_complete());
    let expected = BTreeMap::from([("a".to_owned(), true), ("b".to_owned(), true)]);
    assert_eq!(stack.runtime.live_servers(stack.tenant), expected);
    let servers = stack
        .state
        .mcp_servers
        .list(stack.tenant)
        .await
        .expect("list servers");
    assert!(servers.iter().all(|server| !server.needs_sync()));
}
