//! `PostgreSQL` adapters for agent component persistence.

mod models;
mod repository;
mod schema;

pub use repository::{AgentComponentPgPool, PostgresAgentComponentRepository};
