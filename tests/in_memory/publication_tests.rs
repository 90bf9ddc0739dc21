//! Publication invariants under concurrency and across tenants.

use std::collections::HashSet;

use futures_util::future::join_all;
use rstest::rstest;
use switchboard::publication::{domain::AgentComponentId, services::PublicationServiceError};

use crate::test_helpers::{Stack, stack};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_publishes_leave_exactly_one_live_agent(stack: Stack) {
    let mut agents = Vec::new();
    for index in 0..8 {
        agents.push(stack.agent(&format!("Agent {index}")).await);
    }

    let publishes = agents.iter().map(|agent| {
        let publication = stack.state.publication.clone();
        let tenant = stack.tenant;
        let id = agent.id();
        tokio::spawn(async move { publication.publish(tenant, id).await })
    });
    for outcome in join_all(publishes).await {
        outcome.expect("publish task").expect("publish succeeds");
    }

    let listed = stack
        .state
        .publication
        .list(stack.tenant)
        .await
        .expect("list agents");
    let live: Vec<_> = listed.iter().filter(|agent| agent.is_published()).collect();
    assert_eq!(live.len(), 1);

    let current = stack
        .state
        .publication
        .current_live(stack.tenant)
        .await
        .expect("read live agent")
        .expect("one agent is live");
    assert_eq!(current.id(), live.first().expect("live agent").id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn republishing_demotes_every_previous_agent(stack: Stack) {
    let first = stack.agent("First").await;
    let second = stack.agent("Second").await;

    stack
        .state
        .publication
        .publish(stack.tenant, first.id())
        .await
        .expect("publish first");
    let outcome = stack
        .state
        .publication
        .publish(stack.tenant, second.id())
        .await
        .expect("publish second");

    assert_eq!(outcome.demoted(), [first.id()].as_slice());
    let refreshed = stack
        .state
        .publication
        .get(stack.tenant, first.id())
        .await
        .expect("reload first");
    assert!(!refreshed.is_published());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publishing_is_scoped_to_the_tenant(stack: Stack) {
    let mine = stack.agent("Mine").await;
    stack
        .state
        .publication
        .publish(stack.tenant, mine.id())
        .await
        .expect("publish");

    let result = stack
        .state
        .publication
        .publish(stack.other_tenant, mine.id())
        .await;
    assert!(matches!(result, Err(PublicationServiceError::NotFound(_))));

    let others_live = stack
        .state
        .publication
        .current_live(stack.other_tenant)
        .await
        .expect("read other tenant");
    assert!(others_live.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publish_then_unpublish_leaves_no_live_agent(stack: Stack) {
    let agents = [stack.agent("A").await, stack.agent("B").await];
    let ids: HashSet<_> = agents.iter().map(|agent| agent.id()).collect();
    assert_eq!(ids.len(), 2);

    for agent in &agents {
        stack
            .state
            .publication
            .publish(stack.tenant, agent.id())
            .await
            .expect("publish");
    }
    let last = agents.last().expect("two agents");
    let unpublished = stack
        .state
        .publication
        .unpublish(stack.tenant, last.id())
        .await
        .expect("unpublish");

    assert!(!unpublished.is_published());
    assert!(
        stack
            .state
            .publication
            .current_live(stack.tenant)
            .await
            .expect("read live agent")
            .is_none()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unpublishing_twice_reports_unpublished_both_times(stack: Stack) {
    let agent = stack.agent("Helper").await;
    stack
        .state
        .publication
        .publish(stack.tenant, agent.id())
        .await
        .expect("publish");

    let first = stack
        .state
        .publication
        .unpublish(stack.tenant, agent.id())
        .await
        .expect("first unpublish");
    let second = stack
        .state
        .publication
        .unpublish(stack.tenant, agent.id())
        .await
        .expect("second unpublish");

    assert!(!first.is_published());
    assert!(!second.is_published());
    assert_eq!(first.id(), second.id());
    let live = stack
        .state
        .publication
        .current_live(stack.tenant)
        .await
        .expect("read live agent");
    assert!(live.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publishing_an_unknown_agent_is_not_found(stack: Stack) {
    let missing = AgentComponentId::new();

    let outcome = stack.state.publication.publish(stack.tenant, missing).await;

    assert!(matches!(outcome, Err(PublicationServiceError::NotFound(id)) if id == missing));
}
