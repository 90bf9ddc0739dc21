//! Port contracts for agent component publication.

mod repository;

pub use repository::{
    AgentComponentRepository, AgentComponentRepositoryError, AgentComponentRepositoryResult,
};
