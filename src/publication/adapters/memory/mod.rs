//! In-memory agent component adapters.

mod repository;

pub use repository::InMemoryAgentComponentRepository;
