//! Port contracts for workflow persistence.

mod repository;

pub use repository::{WorkflowRepository, WorkflowRepositoryError, WorkflowRepositoryResult};
