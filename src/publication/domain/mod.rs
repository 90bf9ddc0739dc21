//! Domain model for agent components and their publication state.

mod agent;
mod error;
mod ids;
mod outcome;
mod persona;

pub use agent::{AgentComponent, PersistedAgentComponentData};
pub use error::PublicationDomainError;
pub use ids::AgentComponentId;
pub use outcome::{PublishOutcome, UnpublishOutcome};
pub use persona::AgentPersona;
