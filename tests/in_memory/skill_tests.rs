//! Skill exposure is independent of agent publication.

use rstest::rstest;
use switchboard::skill::services::SkillRegistryServiceError;

use crate::test_helpers::{Stack, stack};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn toggling_skills_leaves_publication_untouched(stack: Stack) {
    let agent = stack.agent("Helper").await;
    stack
        .state
        .publication
        .publish(stack.tenant, agent.id())
        .await
        .expect("publish");
    let before = stack
        .state
        .publication
        .get(stack.tenant, agent.id())
        .await
        .expect("read agent");

    let skill = stack.skill("Summarise").await;
    stack
        .state
        .skills
        .set_skill(stack.tenant, skill.id(), false)
        .await
        .expect("hide skill");

    let after = stack
        .state
        .publication
        .get(stack.tenant, agent.id())
        .await
        .expect("read agent");
    assert_eq!(before, after);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publishing_leaves_skill_flags_untouched(stack: Stack) {
    let exposed = stack.skill("Exposed").await;
    let agent = stack.agent("Helper").await;

    stack
        .state
        .publication
        .publish(stack.tenant, agent.id())
        .await
        .expect("publish");
    stack
        .state
        .publication
        .unpublish(stack.tenant, agent.id())
        .await
        .expect("unpublish");

    let skills = stack
        .state
        .skills
        .list_skills(stack.tenant)
        .await
        .expect("list skills");
    assert_eq!(skills.len(), 1);
    assert_eq!(skills.first().expect("one skill").id(), exposed.id());
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test(flavor = "multi_thread")]
async fn setting_the_same_value_twice_is_idempotent(stack: Stack, #[case] exposed: bool) {
    let workflow = stack.skill("Toggle me").await;

    let first = stack
        .state
        .skills
        .set_skill(stack.tenant, workflow.id(), exposed)
        .await
        .expect("first toggle");
    let second = stack
        .state
        .skills
        .set_skill(stack.tenant, workflow.id(), exposed)
        .await
        .expect("second toggle");

    assert_eq!(first.is_agent_skill(), exposed);
    assert_eq!(first.updated_at(), second.updated_at());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn other_tenants_cannot_toggle_a_workflow(stack: Stack) {
    let workflow = stack.skill("Private").await;

    let result = stack
        .state
        .skills
        .set_skill(stack.other_tenant, workflow.id(), false)
        .await;

    assert!(matches!(result, Err(SkillRegistryServiceError::NotFound(_))));
}
