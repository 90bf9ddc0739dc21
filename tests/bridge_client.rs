//! Bridge client and tool watcher against a loopback server.

mod test_helpers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;
use switchboard::bridge::client::{BridgeClient, BridgeClientError, RetryPolicy, ToolWatcher};
use switchboard::http::build_router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use url::Url;

use test_helpers::{IDENTITY, Stack};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(40),
    }
}

async fn serve(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve router");
    });
    base_url(addr)
}

fn base_url(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{addr}/")).expect("valid base url")
}

async fn serve_stack(stack: &Stack) -> Url {
    serve(build_router(Arc::new(stack.state.clone()))).await
}

async fn publish_helper(stack: &Stack) {
    let agent = stack.agent("Helper").await;
    stack
        .state
        .publication
        .publish(stack.tenant, agent.id())
        .await
        .expect("publish");
}

#[tokio::test(flavor = "multi_thread")]
async fn client_lists_and_calls_live_tools() {
    let stack = Stack::new();
    stack.skill("Summarise").await;
    publish_helper(&stack).await;
    let client = BridgeClient::new(
        serve_stack(&stack).await,
        stack.bridge_token().await,
        REQUEST_TIMEOUT,
    )
    .expect("client");

    let tools = client.list_tools().await.expect("list tools");
    let result = client
        .call_tool("summarise", &json!({ "message": "hi" }), None)
        .await
        .expect("call tool");

    assert_eq!(tools.len(), 1);
    assert!(!result.is_error);
    assert_eq!(result.joined_text(), "Helper: hi");
}

#[tokio::test(flavor = "multi_thread")]
async fn client_maps_rejections_without_retrying() {
    let stack = Stack::new();
    let url = serve_stack(&stack).await;
    let valid = BridgeClient::new(url.clone(), stack.bridge_token().await, REQUEST_TIMEOUT)
        .expect("client");
    let invalid = BridgeClient::new(url, "brg_not-a-token", REQUEST_TIMEOUT).expect("client");

    let missing = valid.call_tool("summarise", &json!({}), None).await;
    let rejected = invalid.list_tools().await;

    assert!(matches!(missing, Err(BridgeClientError::NotFound(_))));
    assert!(matches!(rejected, Err(BridgeClientError::Unauthorized(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn client_retries_server_errors() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/api/v1/mcp/bridge/tools",
        get(move || {
            let seen = counter.clone();
            async move {
                if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                    StatusCode::SERVICE_UNAVAILABLE.into_response()
                } else {
                    axum::Json(json!({ "tools": [] })).into_response()
                }
            }
        }),
    );
    let client = BridgeClient::new(serve(router).await, "brg_token", REQUEST_TIMEOUT)
        .expect("client")
        .with_retry(fast_retry(3));

    let tools = client.list_tools().await.expect("third attempt succeeds");

    assert!(tools.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn client_gives_up_on_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    let client = BridgeClient::new(base_url(addr), "brg_token", REQUEST_TIMEOUT)
        .expect("client")
        .with_retry(fast_retry(2));

    let outcome = client.list_tools().await;

    assert!(matches!(outcome, Err(BridgeClientError::Transport(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn watcher_publishes_changes_and_stops_on_revocation() {
    let stack = Stack::new();
    stack.skill("Summarise").await;
    let client = BridgeClient::new(
        serve_stack(&stack).await,
        stack.bridge_token().await,
        REQUEST_TIMEOUT,
    )
    .expect("client");
    let watcher = ToolWatcher::spawn(client, Duration::from_millis(20), CancellationToken::new());
    let mut changes = watcher.subscribe();
    assert!(watcher.current().is_empty());

    publish_helper(&stack).await;
    tokio::time::timeout(Duration::from_secs(5), changes.changed())
        .await
        .expect("tool list changes")
        .expect("watcher alive");
    assert_eq!(watcher.current().len(), 1);

    stack.state.bridge.revoke(IDENTITY).await.expect("revoke");
    tokio::time::timeout(Duration::from_secs(5), changes.changed())
        .await
        .expect("tool list cleared")
        .expect("watcher alive");
    assert!(watcher.current().is_empty());
    tokio::time::timeout(Duration::from_secs(5), watcher.join())
        .await
        .expect("watcher stops after rejection");
}

#[tokio::test(flavor = "multi_thread")]
async fn watcher_stops_on_cancellation() {
    let stack = Stack::new();
    let client = BridgeClient::new(
        serve_stack(&stack).await,
        stack.bridge_token().await,
        REQUEST_TIMEOUT,
    )
    .expect("client");
    let cancel = CancellationToken::new();
    let watcher = ToolWatcher::spawn(client, Duration::from_millis(20), cancel.clone());

    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), watcher.join())
        .await
        .expect("watcher stops after cancellation");
}
