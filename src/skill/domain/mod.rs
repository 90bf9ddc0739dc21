//! Domain model for workflows and their skill exposure.

mod error;
mod ids;
mod slug;
mod workflow;

pub use error::SkillDomainError;
pub use ids::{WorkflowId, WorkflowName};
pub use slug::slugify;
pub use workflow::{PersistedWorkflowData, Workflow};
