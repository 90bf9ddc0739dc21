//! In-memory workflow adapters.

mod repository;

pub use repository::InMemoryWorkflowRepository;
