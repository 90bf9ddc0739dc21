//! Results of publication state changes.

use super::{AgentComponent, AgentComponentId};
use serde::Serialize;

/// Result of an exclusive publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    agent: AgentComponent,
    demoted: Vec<AgentComponentId>,
}

impl PublishOutcome {
    /// Creates an outcome from the published component and the demoted ids.
    #[must_use]
    pub const fn new(agent: AgentComponent, demoted: Vec<AgentComponentId>) -> Self {
        Self { agent, demoted }
    }

    /// Returns the now-published component.
    #[must_use]
    pub const fn agent(&self) -> &AgentComponent {
        &self.agent
    }

    /// Returns components that were published before and are not any more.
    #[must_use]
    pub fn demoted(&self) -> &[AgentComponentId] {
        &self.demoted
    }

    /// Consumes the outcome, returning the published component.
    #[must_use]
    pub fn into_agent(self) -> AgentComponent {
        self.agent
    }
}

/// Result of an unpublish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpublishOutcome {
    agent: AgentComponent,
    changed: bool,
}

impl UnpublishOutcome {
    /// Creates an outcome.
    #[must_use]
    pub const fn new(agent: AgentComponent, changed: bool) -> Self {
        Self { agent, changed }
    }

    /// Returns the component after the call.
    #[must_use]
    pub const fn agent(&self) -> &AgentComponent {
        &self.agent
    }

    /// Returns whether the component was published before the call.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.changed
    }

    /// Consumes the outcome, returning the component.
    #[must_use]
    pub fn into_agent(self) -> AgentComponent {
        self.agent
    }
}
