//! Bridge tokens always resolve against the current publication state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use rstest::rstest;
use serde_json::{Value, json};
use switchboard::bridge::{
    ports::{FlowExecutor, FlowExecutorError, FlowExecutorResult},
    services::{BridgeSessionError, ToolCall},
};
use switchboard::http::ServiceTimeouts;
use switchboard::publication::domain::AgentComponent;
use switchboard::skill::domain::Workflow;

use crate::test_helpers::{IDENTITY, OTHER_IDENTITY, Stack, stack};

mock! {
    pub Executor {}

    #[async_trait]
    impl FlowExecutor for Executor {
        async fn execute(
            &self,
            agent: &AgentComponent,
            workflow: &Workflow,
            arguments: &Value,
        ) -> FlowExecutorResult<String>;
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn existing_token_follows_republication(stack: Stack) {
    let token = stack.bridge_token().await;
    let skill = stack.skill("Summarise").await;
    let first = stack.agent("First").await;
    let second = stack.agent("Second").await;

    stack
        .state
        .publication
        .publish(stack.tenant, first.id())
        .await
        .expect("publish first");
    stack
        .state
        .bridge
        .call_tool(&token, ToolCall::message("summarise", "hello"))
        .await
        .expect("call while first is live");

    stack
        .state
        .publication
        .publish(stack.tenant, second.id())
        .await
        .expect("publish second");
    let result = stack
        .state
        .bridge
        .call_tool(&token, ToolCall::message("summarise", "hello"))
        .await
        .expect("call while second is live");

    assert!(!result.is_error);
    assert_eq!(result.joined_text(), "Second: hello");
    assert_eq!(
        stack.executor.calls(),
        [(first.id(), skill.id()), (second.id(), skill.id())]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unpublishing_withdraws_every_tool(stack: Stack) {
    let token = stack.bridge_token().await;
    stack.skill("Summarise").await;
    let agent = stack.agent("Helper").await;
    stack
        .state
        .publication
        .publish(stack.tenant, agent.id())
        .await
        .expect("publish");
    let tools = stack.state.bridge.list_tools(&token).await.expect("list");
    assert_eq!(tools.len(), 1);

    stack
        .state
        .publication
        .unpublish(stack.tenant, agent.id())
        .await
        .expect("unpublish");

    assert!(stack.state.bridge.list_tools(&token).await.expect("list").is_empty());
    let call = stack
        .state
        .bridge
        .call_tool(&token, ToolCall::message("summarise", "hello"))
        .await;
    assert!(matches!(call, Err(BridgeSessionError::ToolNotFound(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tokens_only_see_their_own_tenant(stack: Stack) {
    stack.skill("Mine").await;
    let agent = stack.agent("Helper").await;
    stack
        .state
        .publication
        .publish(stack.tenant, agent.id())
        .await
        .expect("publish");

    let other = stack
        .state
        .bridge
        .bootstrap(OTHER_IDENTITY)
        .await
        .expect("bootstrap other tenant");

    assert!(other.published_agent.is_none());
    assert!(other.skills.is_empty());
    let tools = stack
        .state
        .bridge
        .list_tools(other.token.value().expose())
        .await
        .expect("list");
    assert!(tools.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revocation_mints_a_fresh_token_on_next_bootstrap(stack: Stack) {
    let original = stack.bridge_token().await;

    let revoked = stack.state.bridge.revoke(IDENTITY).await.expect("revoke");
    let replacement = stack.bridge_token().await;

    assert!(revoked);
    assert_ne!(original, replacement);
    assert!(matches!(
        stack.state.bridge.list_tools(&original).await,
        Err(BridgeSessionError::Unauthorized)
    ));
    assert!(stack.state.bridge.list_tools(&replacement).await.is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn executor_receives_the_live_agent_and_arguments() {
    let mut executor = MockExecutor::new();
    executor
        .expect_execute()
        .withf(|agent, workflow, arguments| {
            agent.persona().name() == "Helper"
                && workflow.name().as_str() == "Translate"
                && arguments == &json!({ "message": "bonjour" })
        })
        .times(1)
        .returning(|_, _, _| Ok("hello".to_owned()));
    let stack = Stack::with_executor(Arc::new(executor));
    let token = stack.bridge_token().await;
    stack.skill("Translate").await;
    let agent = stack.agent("Helper").await;
    stack
        .state
        .publication
        .publish(stack.tenant, agent.id())
        .await
        .expect("publish");

    let result = stack
        .state
        .bridge
        .call_tool(&token, ToolCall::message("translate", "bonjour"))
        .await
        .expect("call");

    assert_eq!(result.joined_text(), "hello");
}

#[tokio::test(flavor = "multi_thread")]
async fn workflow_failures_are_reported_in_the_result() {
    let mut executor = MockExecutor::new();
    executor
        .expect_execute()
        .returning(|_, _, _| Err(FlowExecutorError::Failed("model refused".to_owned())));
    let stack = Stack::with_executor(Arc::new(executor));
    let token = stack.bridge_token().await;
    stack.skill("Translate").await;
    let agent = stack.agent("Helper").await;
    stack
        .state
        .publication
        .publish(stack.tenant, agent.id())
        .await
        .expect("publish");

    let result = stack
        .state
        .bridge
        .call_tool(&token, ToolCall::message("translate", "bonjour"))
        .await
        .expect("call");

    assert!(result.is_error);
    assert_eq!(result.joined_text(), "Workflow error: model refused");
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_call_timeout_is_reported() {
    let stack = Stack::with_timeouts(ServiceTimeouts {
        tool_call: Duration::from_secs(1),
        ..ServiceTimeouts::default()
    });
    let token = stack.bridge_token().await;
    let skill = stack.skill("Slow").await;
    let agent = stack.agent("Helper").await;
    stack
        .state
        .publication
        .publish(stack.tenant, agent.id())
        .await
        .expect("publish");
    stack.executor.stall(skill.id(), Duration::from_secs(5));

    let result = stack
        .state
        .bridge
        .call_tool(&token, ToolCall::message("slow", "hi"))
        .await
        .expect("call");

    assert!(result.is_error);
    assert_eq!(result.joined_text(), "Tool execution timed out after 1 seconds.");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn skills_with_colliding_slugs_get_distinct_tool_names(stack: Stack) {
    let token = stack.bridge_token().await;
    let first = stack.skill("Summarise").await;
    let second = stack.skill("summarise!").await;
    let agent = stack.agent("Helper").await;
    stack
        .state
        .publication
        .publish(stack.tenant, agent.id())
        .await
        .expect("publish");

    let tools = stack.state.bridge.list_tools(&token).await.expect("list");
    let names: Vec<_> = tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names, ["summarise", "summarise-2"]);

    stack
        .state
        .bridge
        .call_tool(&token, ToolCall::message("summarise-2", "hi"))
        .await
        .expect("call suffixed tool");

    assert_eq!(stack.executor.calls(), [(agent.id(), second.id())]);
    assert_ne!(first.id(), second.id());
}
